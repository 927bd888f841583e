//! Regularizes irregular minute-resolution weather station logs into hourly
//! series, either one aggregate per hour or an 8x8 grid of the hour's minutes,
//! and writes them as self-describing Parquet files.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use config::{ConverterConfig, ParseConfig, Separator};
pub use error::{ProcessingError, Result};
pub use processors::{ConversionResult, StationConverter};
