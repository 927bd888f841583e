use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An observation reduced to the target quantity (Kelvin) while keeping the other sensor values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingReading {
    pub timestamp: NaiveDateTime,
    pub tas: Option<f64>,
    pub sensors: Vec<Option<f64>>,
}

impl WorkingReading {
    pub fn new(timestamp: NaiveDateTime, tas: Option<f64>, sensors: Vec<Option<f64>>) -> Self {
        Self {
            timestamp,
            tas,
            sensors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingTable {
    pub sensors: Vec<String>,
    pub rows: Vec<WorkingReading>,
}

impl WorkingTable {
    pub fn new(sensors: Vec<String>, rows: Vec<WorkingReading>) -> Self {
        Self { sensors, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Concatenate tables in the given order.
    ///
    /// Sensor columns are unioned by name in first-seen order; a table lacking a
    /// column contributes missing values for it.
    pub fn concat(tables: Vec<WorkingTable>) -> WorkingTable {
        let mut sensors: Vec<String> = Vec::new();
        for table in &tables {
            for name in &table.sensors {
                if !sensors.contains(name) {
                    sensors.push(name.clone());
                }
            }
        }

        let total = tables.iter().map(WorkingTable::len).sum();
        let mut rows = Vec::with_capacity(total);

        for table in tables {
            let aligned = table.sensors == sensors;
            let positions: Vec<Option<usize>> =
                sensors.iter().map(|name| table.column_index(name)).collect();

            for row in table.rows {
                if aligned {
                    rows.push(row);
                    continue;
                }
                let values = positions
                    .iter()
                    .map(|pos| pos.and_then(|i| row.sensors[i]))
                    .collect();
                rows.push(WorkingReading::new(row.timestamp, row.tas, values));
            }
        }

        WorkingTable { sensors, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = WorkingTable::new(
            vec!["mcp9808".to_string()],
            vec![WorkingReading::new(ts(0), Some(293.15), vec![Some(20.0)])],
        );
        let b = WorkingTable::new(
            vec!["mcp9808".to_string()],
            vec![WorkingReading::new(ts(1), Some(294.15), vec![Some(21.0)])],
        );

        let merged = WorkingTable::concat(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows[0].timestamp, ts(0));
        assert_eq!(merged.rows[1].timestamp, ts(1));
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = WorkingTable::new(
            vec!["mcp9808".to_string()],
            vec![WorkingReading::new(ts(0), Some(293.15), vec![Some(20.0)])],
        );
        let b = WorkingTable::new(
            vec!["vis_light".to_string(), "mcp9808".to_string()],
            vec![WorkingReading::new(
                ts(1),
                Some(294.15),
                vec![Some(300.0), Some(21.0)],
            )],
        );

        let merged = WorkingTable::concat(vec![a, b]);
        assert_eq!(merged.sensors, vec!["mcp9808", "vis_light"]);
        assert_eq!(merged.rows[0].sensors, vec![Some(20.0), None]);
        assert_eq!(merged.rows[1].sensors, vec![Some(21.0), Some(300.0)]);
    }
}
