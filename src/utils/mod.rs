pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{output_path, station_file};
pub use progress::ProgressReporter;
