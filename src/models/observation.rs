use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One parsed log line: combined timestamp plus raw sensor readings (sentinels intact)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub values: Vec<f64>,
}

impl RawRecord {
    pub fn new(timestamp: NaiveDateTime, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }

    /// Build from the separate date/time fields of a log line
    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        values: Vec<f64>,
    ) -> Option<Self> {
        let timestamp = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        Some(Self::new(timestamp, values))
    }
}

/// All records of one log file, with the sensor column names in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub source: PathBuf,
    pub sensors: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(source: PathBuf, sensors: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self {
            source,
            sensors,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record after sentinel normalization; `None` marks a missing reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Self { timestamp, values }
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub source: PathBuf,
    pub sensors: Vec<String>,
    pub rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(source: PathBuf, sensors: Vec<String>, rows: Vec<Observation>) -> Self {
        Self {
            source,
            sensors,
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s == name)
    }

    /// Values of one sensor column in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
