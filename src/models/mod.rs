pub mod hourly;
pub mod log_table;
pub mod observation;
pub mod output;
pub mod reading;
pub mod station;

pub use hourly::{CellGrid, HourlyPayload, HourlyTable, NamedSeries};
pub use log_table::{LogRow, LogTable};
pub use observation::{Observation, ObservationTable, RawRecord, RawTable};
pub use output::{CanonicalColumn, OutputTable, OutputVariables};
pub use reading::{WorkingReading, WorkingTable};
pub use station::{GridBlueprint, StationMetadata};
