use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalColumn, LogRow, LogTable, OutputTable, OutputVariables, WorkingTable};
use crate::processors::sensor_selector::{kelvin_to_celsius, round_to};
use crate::utils::constants::{DEFAULT_ROUNDING_PRECISION, DEFAULT_TAS_SENSOR, MISSING_SENTINEL};

/// Reverses the selector: Kelvin back to Celsius under the sensor's own name, with
/// missing values written as the sentinel.
pub struct Exporter {
    target_sensor: String,
    rounding_precision: u32,
}

impl Exporter {
    pub fn new(target_sensor: impl Into<String>, rounding_precision: u32) -> Self {
        Self {
            target_sensor: target_sensor.into(),
            rounding_precision,
        }
    }

    pub fn target_sensor(&self) -> &str {
        &self.target_sensor
    }

    fn encode(&self, value: Option<f64>) -> f64 {
        value
            .map(|v| round_to(v, self.rounding_precision))
            .unwrap_or(MISSING_SENTINEL)
    }

    fn encode_kelvin(&self, value: Option<f64>) -> f64 {
        self.encode(value.map(kelvin_to_celsius))
    }

    /// Per-minute table back to the log schema; the target sensor column is
    /// rebuilt from the derived temperature.
    pub fn export_working(&self, table: &WorkingTable) -> LogTable {
        let target = table.column_index(&self.target_sensor);
        let mut columns = table.sensors.clone();
        if target.is_none() {
            columns.push(self.target_sensor.clone());
        }

        let rows = table
            .rows
            .iter()
            .map(|reading| {
                let mut values: Vec<f64> = reading
                    .sensors
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        if Some(i) == target {
                            self.encode_kelvin(reading.tas)
                        } else {
                            self.encode(v)
                        }
                    })
                    .collect();
                if target.is_none() {
                    values.push(self.encode_kelvin(reading.tas));
                }
                LogRow {
                    timestamp: reading.timestamp,
                    values,
                }
            })
            .collect();

        LogTable { columns, rows }
    }

    /// Scalar-mode output back to the log schema. Grid output has no per-minute
    /// form and is rejected.
    pub fn export_hourly(&self, table: &OutputTable) -> Result<LogTable> {
        let columns = match &table.variables {
            OutputVariables::Scalar(columns) => columns,
            OutputVariables::Grid { .. } => {
                return Err(ProcessingError::Config(
                    "Gridded output cannot be exported to the log format".to_string(),
                ))
            }
        };

        let names = columns
            .iter()
            .map(|(column, _)| match column {
                CanonicalColumn::Tas => self.target_sensor.clone(),
                other => other.output_name().to_string(),
            })
            .collect();

        let rows = table
            .hours
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| LogRow {
                timestamp,
                values: columns
                    .iter()
                    .map(|(column, values)| match column {
                        CanonicalColumn::Tas => self.encode_kelvin(values[i]),
                        _ => self.encode(values[i]),
                    })
                    .collect(),
            })
            .collect();

        Ok(LogTable {
            columns: names,
            rows,
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_TAS_SENSOR, DEFAULT_ROUNDING_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellGrid, ObservationTable, Observation, WorkingReading};
    use crate::processors::sensor_selector::SensorSelector;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_selector_then_exporter_is_identity() {
        let observed = vec![
            vec![Some(20.0), Some(120.5)],
            vec![Some(-3.25), None],
            vec![None, Some(0.0)],
        ];
        let table = ObservationTable::new(
            PathBuf::from("a.dat"),
            vec!["mcp9808".to_string(), "vis_light".to_string()],
            observed
                .iter()
                .enumerate()
                .map(|(i, v)| Observation::new(ts(i as u32), v.clone()))
                .collect(),
        );

        let working = SensorSelector::new(vec!["mcp9808".to_string()])
            .unwrap()
            .select(table)
            .unwrap();
        let log = Exporter::default().export_working(&working);

        assert_eq!(log.columns, vec!["mcp9808", "vis_light"]);
        assert_eq!(log.column("mcp9808").unwrap(), vec![20.0, -3.25, -999.99]);
        assert_eq!(log.column("vis_light").unwrap(), vec![120.5, -999.99, 0.0]);
    }

    #[test]
    fn test_missing_target_column_is_appended() {
        let working = WorkingTable::new(
            vec!["bme280".to_string()],
            vec![WorkingReading::new(ts(0), Some(300.0), vec![Some(1.234)])],
        );
        let log = Exporter::new("mcp9808", 1).export_working(&working);

        assert_eq!(log.columns, vec!["bme280", "mcp9808"]);
        assert_eq!(log.rows[0].values, vec![1.2, 26.9]);
    }

    #[test]
    fn test_export_hourly() {
        let output = OutputTable {
            hours: vec![ts(0)],
            variables: OutputVariables::Scalar(vec![
                (CanonicalColumn::Tas, vec![Some(294.15)]),
                (CanonicalColumn::UvLight, vec![None]),
            ]),
        };
        let log = Exporter::default().export_hourly(&output).unwrap();

        assert_eq!(log.columns, vec!["mcp9808", "uv_light"]);
        assert_eq!(log.rows[0].values, vec![21.0, -999.99]);
    }

    #[test]
    fn test_export_grid_is_rejected() {
        let output = OutputTable {
            hours: vec![ts(0)],
            variables: OutputVariables::Grid {
                tas: vec![CellGrid::new()],
            },
        };
        assert!(matches!(
            Exporter::default().export_hourly(&output),
            Err(ProcessingError::Config(_))
        ));
    }
}
