/// Reserved value the station loggers write for "no reading"
pub const MISSING_SENTINEL: f64 = -999.99;

/// Offset between Celsius and Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

/// Output grid geometry
pub const GRID_ROWS: usize = 8;
pub const GRID_COLS: usize = 8;
pub const GRID_CELLS: usize = GRID_ROWS * GRID_COLS;
pub const MINUTES_PER_HOUR: usize = 60;

/// Buckets with this many distinct values or fewer aggregate to missing
pub const MAX_UNRELIABLE_DISTINCT: usize = 2;

/// Date/time column names of the log schema
pub const COL_YEAR: &str = "year";
pub const COL_MONTH: &str = "mon";
pub const COL_DAY: &str = "day";
pub const COL_HOUR: &str = "hour";
pub const COL_MINUTE: &str = "min";

/// Working column holding the converted target quantity
pub const COL_TAS: &str = "tas";

/// Default temperature sensor of the station loggers
pub const DEFAULT_TAS_SENSOR: &str = "mcp9808";

/// File extensions
pub const DATA_FILE_EXTENSION: &str = "dat";
pub const METADATA_FILE_EXTENSION: &str = "rtf";
pub const OUTPUT_FILE_EXTENSION: &str = "parquet";

/// Directory defaults, relative to the working directory
pub const DEFAULT_SOURCE_ROOT: &str = "station_data_as_dat";
pub const DEFAULT_TARGET_ROOT: &str = "station_data_as_parquet";

/// Parsing defaults
pub const DEFAULT_ROUNDING_PRECISION: u32 = 2;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "STATION_REGRID";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
