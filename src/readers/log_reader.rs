use crate::config::{ParseConfig, Separator};
use crate::error::{ProcessingError, Result};
use crate::models::{RawRecord, RawTable};
use crate::utils::constants::{COL_DAY, COL_HOUR, COL_MINUTE, COL_MONTH, COL_YEAR};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Accepted spellings of the date/time columns
const YEAR_NAMES: &[&str] = &[COL_YEAR];
const MONTH_NAMES: &[&str] = &[COL_MONTH, "month"];
const DAY_NAMES: &[&str] = &[COL_DAY];
const HOUR_NAMES: &[&str] = &[COL_HOUR];
const MINUTE_NAMES: &[&str] = &[COL_MINUTE, "minute"];

/// A non-blank line split into fields, with its 1-based line number
struct TokenizedLine {
    line: usize,
    fields: Vec<String>,
}

/// Positions of the timestamp fields and the sensor columns within a row
struct ColumnLayout {
    year: usize,
    month: usize,
    day: usize,
    hour: usize,
    minute: usize,
    sensor_positions: Vec<usize>,
    sensor_names: Vec<String>,
    width: usize,
}

/// Decode file content as UTF-8, naming the line that holds the first bad byte
fn decode<'a>(bytes: &'a [u8], path: &Path) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        ProcessingError::parse(path, line, format!("Invalid UTF-8: {}", e))
    })
}

pub struct LogReader {
    config: ParseConfig,
    use_mmap: bool,
}

impl LogReader {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            config,
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read one station log file. Any malformed row fails the whole file.
    pub fn read_file(&self, path: &Path) -> Result<RawTable> {
        let table = if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            self.parse_str(decode(&mmap, path)?, path)?
        } else {
            let bytes = std::fs::read(path)?;
            self.parse_str(decode(&bytes, path)?, path)?
        };

        tracing::debug!(
            file = %path.display(),
            records = table.len(),
            sensors = table.sensors.len(),
            "Parsed station log"
        );

        Ok(table)
    }

    /// Parse log content; `source` names the file in errors
    pub fn parse_str(&self, content: &str, source: &Path) -> Result<RawTable> {
        let lines = self.tokenize(content, source)?;

        let (layout, data) = match self.config.header_row_index {
            Some(index) => {
                let header = lines.get(index).ok_or_else(|| {
                    ProcessingError::parse(
                        source,
                        index + 1,
                        format!("Missing header row {}", index),
                    )
                })?;
                let layout = Self::resolve_layout(&header.fields, header.line, source)?;
                (layout, &lines[index + 1..])
            }
            None => {
                let names = self.config.column_names.clone().unwrap_or_default();
                (Self::resolve_layout(&names, 0, source)?, &lines[..])
            }
        };

        let records = data
            .iter()
            .map(|line| Self::parse_record(line, &layout, source))
            .collect::<Result<Vec<_>>>()?;

        Ok(RawTable::new(
            source.to_path_buf(),
            layout.sensor_names,
            records,
        ))
    }

    fn tokenize(&self, content: &str, source: &Path) -> Result<Vec<TokenizedLine>> {
        match self.config.separator {
            Separator::Whitespace => Ok(content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| TokenizedLine {
                    line: i + 1,
                    fields: line.split_whitespace().map(str::to_string).collect(),
                })
                .collect()),
            Separator::Char(delimiter) => {
                let mut reader = csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .trim(csv::Trim::All)
                    .from_reader(content.as_bytes());

                let mut lines = Vec::new();
                for result in reader.records() {
                    let record = result.map_err(|e| {
                        let line = e.position().map_or(0, |p| p.line() as usize);
                        ProcessingError::parse(source, line, e.to_string())
                    })?;
                    if record.iter().all(str::is_empty) {
                        continue;
                    }
                    let line = record.position().map_or(0, |p| p.line() as usize);
                    lines.push(TokenizedLine {
                        line,
                        fields: record.iter().map(str::to_string).collect(),
                    });
                }
                Ok(lines)
            }
        }
    }

    fn resolve_layout(names: &[String], line: usize, source: &Path) -> Result<ColumnLayout> {
        let find = |aliases: &[&str]| -> Result<usize> {
            names
                .iter()
                .position(|n| aliases.contains(&n.as_str()))
                .ok_or_else(|| {
                    ProcessingError::parse(
                        source,
                        line,
                        format!("Missing date/time column '{}'", aliases[0]),
                    )
                })
        };

        let year = find(YEAR_NAMES)?;
        let month = find(MONTH_NAMES)?;
        let day = find(DAY_NAMES)?;
        let hour = find(HOUR_NAMES)?;
        let minute = find(MINUTE_NAMES)?;
        let time_positions = [year, month, day, hour, minute];

        let (sensor_positions, sensor_names): (Vec<usize>, Vec<String>) = names
            .iter()
            .enumerate()
            .filter(|(i, _)| !time_positions.contains(i))
            .map(|(i, name)| (i, name.clone()))
            .unzip();

        Ok(ColumnLayout {
            year,
            month,
            day,
            hour,
            minute,
            sensor_positions,
            sensor_names,
            width: names.len(),
        })
    }

    fn parse_record(line: &TokenizedLine, layout: &ColumnLayout, source: &Path) -> Result<RawRecord> {
        let fields = &line.fields;
        if fields.len() != layout.width {
            return Err(ProcessingError::parse(
                source,
                line.line,
                format!("Expected {} fields, found {}", layout.width, fields.len()),
            ));
        }

        let int_field = |index: usize, name: &str| -> Result<i64> {
            parse_integer(&fields[index]).ok_or_else(|| {
                ProcessingError::parse(
                    source,
                    line.line,
                    format!("Invalid {} value: '{}'", name, fields[index]),
                )
            })
        };

        let year = int_field(layout.year, COL_YEAR)?;
        let month = int_field(layout.month, COL_MONTH)?;
        let day = int_field(layout.day, COL_DAY)?;
        let hour = int_field(layout.hour, COL_HOUR)?;
        let minute = int_field(layout.minute, COL_MINUTE)?;

        let values = layout
            .sensor_positions
            .iter()
            .map(|&i| {
                fields[i].parse::<f64>().map_err(|_| {
                    ProcessingError::parse(
                        source,
                        line.line,
                        format!("Invalid numeric value: '{}'", fields[i]),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let record = match (
            i32::try_from(year),
            u32::try_from(month),
            u32::try_from(day),
            u32::try_from(hour),
            u32::try_from(minute),
        ) {
            (Ok(y), Ok(mo), Ok(d), Ok(h), Ok(mi)) => RawRecord::from_parts(y, mo, d, h, mi, values),
            _ => None,
        };

        record.ok_or_else(|| {
            ProcessingError::parse(
                source,
                line.line,
                format!(
                    "Invalid date/time: {}-{}-{} {}:{}",
                    year, month, day, hour, minute
                ),
            )
        })
    }
}

impl Default for LogReader {
    fn default() -> Self {
        Self::new(ParseConfig::default())
    }
}

/// Integer field, also accepting integral floats such as "2023.0"
fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    let v = value.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
