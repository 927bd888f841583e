use crate::error::{ProcessingError, Result};
use crate::models::{ObservationTable, WorkingReading, WorkingTable};
use crate::utils::constants::KELVIN_OFFSET;

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Round to `precision` decimal digits, ties to even (numpy's `round`)
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round_ties_even() / factor
}

/// Reduces each observation to the target temperature in Kelvin
pub struct SensorSelector {
    tas_sensors: Vec<String>,
}

impl SensorSelector {
    pub fn new(tas_sensors: Vec<String>) -> Result<Self> {
        if tas_sensors.is_empty() {
            return Err(ProcessingError::Config(
                "At least one temperature sensor must be selected".to_string(),
            ));
        }
        Ok(Self { tas_sensors })
    }

    pub fn sensors(&self) -> &[String] {
        &self.tas_sensors
    }

    /// Row-wise mean over the selected sensors, converted to Kelvin.
    ///
    /// A row whose selected sensors are all missing yields a missing reading.
    pub fn select(&self, table: ObservationTable) -> Result<WorkingTable> {
        let indices = self
            .tas_sensors
            .iter()
            .map(|name| {
                table.column_index(name).ok_or_else(|| {
                    ProcessingError::Config(format!(
                        "Sensor '{}' not present in {} (columns: {})",
                        name,
                        table.source.display(),
                        table.sensors.join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                let (sum, count) = indices
                    .iter()
                    .filter_map(|&i| row.values[i])
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

                let tas = (count > 0).then(|| celsius_to_kelvin(sum / count as f64));
                WorkingReading::new(row.timestamp, tas, row.values)
            })
            .collect();

        Ok(WorkingTable::new(table.sensors, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn table(rows: Vec<Vec<Option<f64>>>) -> ObservationTable {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        ObservationTable::new(
            PathBuf::from("a.dat"),
            vec!["mcp9808".to_string(), "bme280".to_string()],
            rows.into_iter().map(|v| Observation::new(ts, v)).collect(),
        )
    }

    #[test]
    fn test_single_sensor_conversion() {
        let selector = SensorSelector::new(vec!["mcp9808".to_string()]).unwrap();
        let working = selector
            .select(table(vec![vec![Some(20.0), Some(99.0)], vec![None, Some(21.0)]]))
            .unwrap();

        assert!((working.rows[0].tas.unwrap() - 293.15).abs() < 1e-9);
        assert_eq!(working.rows[1].tas, None);
        // Sensor columns are kept for the exporter
        assert_eq!(working.rows[0].sensors, vec![Some(20.0), Some(99.0)]);
    }

    #[test]
    fn test_multi_sensor_mean_skips_missing() {
        let selector =
            SensorSelector::new(vec!["mcp9808".to_string(), "bme280".to_string()]).unwrap();
        let working = selector
            .select(table(vec![
                vec![Some(20.0), Some(22.0)],
                vec![None, Some(22.0)],
                vec![None, None],
            ]))
            .unwrap();

        assert!((working.rows[0].tas.unwrap() - 294.15).abs() < 1e-9);
        assert!((working.rows[1].tas.unwrap() - 295.15).abs() < 1e-9);
        assert_eq!(working.rows[2].tas, None);
    }

    #[test]
    fn test_unknown_sensor_is_config_error() {
        let selector = SensorSelector::new(vec!["sht40".to_string()]).unwrap();
        assert!(matches!(
            selector.select(table(vec![])),
            Err(ProcessingError::Config(_))
        ));
        assert!(SensorSelector::new(vec![]).is_err());
    }

    #[test]
    fn test_unit_round_trip() {
        for hundredths in -5000..=5000 {
            let celsius = hundredths as f64 / 100.0;
            let back = kelvin_to_celsius(celsius_to_kelvin(celsius));
            assert_eq!(round_to(back, 2), round_to(celsius, 2), "value {}", celsius);
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(20.126, 2), 20.13);
        assert_eq!(round_to(-3.14159, 3), -3.142);
        assert_eq!(round_to(7.5, 0), 8.0);
        assert_eq!(round_to(6.5, 0), 6.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(0.125, 2), 0.12);
    }
}
