pub mod log_writer;
pub mod parquet_writer;

pub use log_writer::LogWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
