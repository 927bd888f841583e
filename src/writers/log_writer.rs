use crate::config::ParseConfig;
use crate::error::Result;
use crate::models::LogTable;
use crate::utils::constants::{
    COL_DAY, COL_HOUR, COL_MINUTE, COL_MONTH, COL_YEAR, MISSING_SENTINEL,
};
use chrono::{Datelike, Timelike};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes tables in the station log layout: `year mon day hour min <sensors>`
pub struct LogWriter {
    delimiter: u8,
    precision: usize,
}

impl LogWriter {
    pub fn new(config: &ParseConfig) -> Self {
        Self {
            delimiter: config.separator.output_byte(),
            precision: config.rounding_precision as usize,
        }
    }

    pub fn write(&self, table: &LogTable, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        self.write_to(table, file)?;
        tracing::info!(path = %path.display(), rows = table.len(), "Wrote station log");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, table: &LogTable, sink: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(sink);

        let mut header = vec![COL_YEAR, COL_MONTH, COL_DAY, COL_HOUR, COL_MINUTE];
        header.extend(table.columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in &table.rows {
            let ts = row.timestamp;
            let mut record = vec![
                ts.year().to_string(),
                ts.month().to_string(),
                ts.day().to_string(),
                ts.hour().to_string(),
                ts.minute().to_string(),
            ];
            record.extend(row.values.iter().map(|v| self.format_value(*v)));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn format_value(&self, value: f64) -> String {
        // the sentinel is always written in full so readers recognise it
        if value == MISSING_SENTINEL {
            return format!("{:.2}", MISSING_SENTINEL);
        }
        format!("{:.*}", self.precision, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Separator;
    use crate::models::LogRow;
    use crate::readers::LogReader;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn table() -> LogTable {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        LogTable {
            columns: vec!["mcp9808".to_string(), "vis_light".to_string()],
            rows: vec![LogRow {
                timestamp: ts,
                values: vec![20.0, MISSING_SENTINEL],
            }],
        }
    }

    #[test]
    fn test_whitespace_layout() -> Result<()> {
        let mut out = Vec::new();
        LogWriter::new(&ParseConfig::default()).write_to(&table(), &mut out)?;

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "year mon day hour min mcp9808 vis_light\n2023 7 15 10 5 20.00 -999.99\n"
        );
        Ok(())
    }

    #[test]
    fn test_written_log_parses_back() -> Result<()> {
        let config = ParseConfig::new(Separator::Char(b','), Some(0), 1)?;
        let mut out = Vec::new();
        LogWriter::new(&config).write_to(&table(), &mut out)?;

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("20.0,-999.99"));

        let raw = LogReader::new(config).parse_str(&text, &PathBuf::from("out.dat"))?;
        assert_eq!(raw.sensors, vec!["mcp9808", "vis_light"]);
        assert_eq!(raw.records[0].values, vec![20.0, MISSING_SENTINEL]);
        Ok(())
    }
}
