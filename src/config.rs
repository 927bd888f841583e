use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DEFAULT_ROUNDING_PRECISION, DEFAULT_SOURCE_ROOT, DEFAULT_TARGET_ROOT,
    DEFAULT_TAS_SENSOR, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Field delimiter of a station log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Separator {
    /// One or more blanks between fields
    Whitespace,
    /// A single ASCII delimiter byte
    Char(u8),
}

impl Separator {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "whitespace" | "\\s+" | "" => Ok(Separator::Whitespace),
            "\\t" | "tab" => Ok(Separator::Char(b'\t')),
            other => {
                let bytes = other.as_bytes();
                if bytes.len() == 1 && bytes[0].is_ascii() {
                    Ok(Separator::Char(bytes[0]))
                } else {
                    Err(ProcessingError::Config(format!(
                        "Separator must be 'whitespace' or a single ASCII character, got '{}'",
                        other
                    )))
                }
            }
        }
    }

    /// Byte used when writing files back in this format
    pub fn output_byte(&self) -> u8 {
        match self {
            Separator::Whitespace => b' ',
            Separator::Char(byte) => *byte,
        }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Separator::Whitespace
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Whitespace => write!(f, "whitespace"),
            Separator::Char(b'\t') => write!(f, "\\t"),
            Separator::Char(byte) => write!(f, "{}", *byte as char),
        }
    }
}

impl TryFrom<String> for Separator {
    type Error = ProcessingError;

    fn try_from(value: String) -> Result<Self> {
        Separator::parse(&value)
    }
}

impl From<Separator> for String {
    fn from(separator: Separator) -> Self {
        separator.to_string()
    }
}

/// Per-format parsing options for station log files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ParseConfig {
    pub separator: Separator,

    /// Line (0-based, blank lines excluded) holding the column names; `None` for headerless files
    pub header_row_index: Option<usize>,

    #[validate(range(max = 10))]
    pub rounding_precision: u32,

    /// Column names for headerless files
    pub column_names: Option<Vec<String>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            separator: Separator::Whitespace,
            header_row_index: Some(0),
            rounding_precision: DEFAULT_ROUNDING_PRECISION,
            column_names: None,
        }
    }
}

impl ParseConfig {
    pub fn new(
        separator: Separator,
        header_row_index: Option<usize>,
        rounding_precision: u32,
    ) -> Result<Self> {
        let config = Self {
            separator,
            header_row_index,
            rounding_precision,
            column_names: None,
        };
        config.check()?;
        Ok(config)
    }

    pub fn with_column_names(mut self, names: Vec<String>) -> Result<Self> {
        self.column_names = Some(names);
        self.check()?;
        Ok(self)
    }

    /// Validate field ranges and the header/column-name combination
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if let Separator::Char(byte) = self.separator {
            if !byte.is_ascii() || byte == b'\n' || byte == b'\r' {
                return Err(ProcessingError::Config(format!(
                    "Invalid separator byte: {:#04x}",
                    byte
                )));
            }
        }

        if self.header_row_index.is_none()
            && self.column_names.as_ref().map_or(true, |c| c.is_empty())
        {
            return Err(ProcessingError::Config(
                "Headerless format requires explicit column names".to_string(),
            ));
        }

        Ok(())
    }
}

/// Options for converting one station's log directory
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConverterConfig {
    #[validate(length(min = 1))]
    pub station_name: String,

    #[serde(default)]
    pub source_directory: Option<PathBuf>,

    #[serde(default)]
    pub target_directory: Option<PathBuf>,

    /// Scalar aggregation when true, 8x8 grid placement when false
    #[serde(default)]
    pub hourly: bool,

    #[serde(default)]
    pub grid_blueprint: Option<PathBuf>,

    #[serde(default)]
    pub keep_original: bool,

    #[serde(default = "default_tas_sensors")]
    #[validate(length(min = 1))]
    pub tas_sensors: Vec<String>,

    #[serde(default)]
    pub mapping_table: Option<PathBuf>,

    #[serde(default)]
    pub first_n_files: Option<usize>,

    #[serde(default = "default_max_workers")]
    #[validate(range(min = 1))]
    pub max_workers: usize,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default)]
    pub use_mmap: bool,

    #[serde(default)]
    pub format: ParseConfig,
}

fn default_tas_sensors() -> Vec<String> {
    vec![DEFAULT_TAS_SENSOR.to_string()]
}

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_compression() -> String {
    COMPRESSION_SNAPPY.to_string()
}

impl ConverterConfig {
    pub fn new(station_name: impl Into<String>) -> Self {
        Self {
            station_name: station_name.into(),
            source_directory: None,
            target_directory: None,
            hourly: false,
            grid_blueprint: None,
            keep_original: false,
            tas_sensors: default_tas_sensors(),
            mapping_table: None,
            first_n_files: None,
            max_workers: default_max_workers(),
            compression: default_compression(),
            use_mmap: false,
            format: ParseConfig::default(),
        }
    }

    /// Layer defaults, an optional settings file and `STATION_REGRID__*` environment variables
    pub fn load(path: Option<&Path>, station_name: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        if let Some(name) = station_name {
            builder = builder.set_override("station_name", name)?;
        }

        let config: ConverterConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.format.check()
    }

    /// Fails before any work when grid mode lacks its coordinate blueprint
    pub fn validate_mode(&self) -> Result<()> {
        if !self.hourly && self.grid_blueprint.is_none() {
            return Err(ProcessingError::Config(
                "Grid mode (hourly = false) requires a grid blueprint".to_string(),
            ));
        }
        Ok(())
    }

    pub fn source_directory(&self) -> Result<PathBuf> {
        match &self.source_directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?
                .join(DEFAULT_SOURCE_ROOT)
                .join(capitalize(&self.station_name))),
        }
    }

    pub fn target_directory(&self) -> Result<PathBuf> {
        match &self.target_directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?.join(DEFAULT_TARGET_ROOT)),
        }
    }

    /// Sensor whose column the exporter restores
    pub fn primary_sensor(&self) -> &str {
        self.tas_sensors
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TAS_SENSOR)
    }
}

/// Upper-case the first character, lower-case the rest
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
