pub mod blueprint_reader;
pub mod discovery;
pub mod log_reader;
pub mod metadata_reader;

pub use blueprint_reader::read_blueprint;
pub use discovery::{discover_data_files, find_metadata_file};
pub use log_reader::LogReader;
pub use metadata_reader::MetadataReader;
