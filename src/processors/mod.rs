pub mod coverage;
pub mod exporter;
pub mod mapping;
pub mod normalizer;
pub mod projection;
pub mod resampler;
pub mod sensor_selector;
pub mod station_converter;

pub use coverage::{CoverageChecker, CoverageReport};
pub use exporter::Exporter;
pub use mapping::MappingTable;
pub use normalizer::SentinelNormalizer;
pub use projection::ColumnProjection;
pub use resampler::{aggregate_bucket, ResampleMode, TemporalResampler};
pub use sensor_selector::{celsius_to_kelvin, kelvin_to_celsius, round_to, SensorSelector};
pub use station_converter::{ConversionResult, StationConverter};
