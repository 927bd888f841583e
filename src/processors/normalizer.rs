use crate::models::{Observation, ObservationTable, RawTable};
use crate::utils::constants::MISSING_SENTINEL;

/// Replaces the logger's missing-value sentinel with an explicit missing marker
pub struct SentinelNormalizer {
    sentinel: f64,
}

impl SentinelNormalizer {
    pub fn new() -> Self {
        Self {
            sentinel: MISSING_SENTINEL,
        }
    }

    /// Exact sentinel matches and NaN become `None`; everything else passes through
    pub fn normalize_value(&self, value: f64) -> Option<f64> {
        if value == self.sentinel || value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    pub fn normalize(&self, raw: RawTable) -> ObservationTable {
        let rows = raw
            .records
            .into_iter()
            .map(|record| {
                let values = record
                    .values
                    .into_iter()
                    .map(|v| self.normalize_value(v))
                    .collect();
                Observation::new(record.timestamp, values)
            })
            .collect();

        ObservationTable::new(raw.source, raw.sensors, rows)
    }

    /// Normalize a table that may already be partly normalized; a no-op on normalized input
    pub fn renormalize(&self, table: ObservationTable) -> ObservationTable {
        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                let values = row
                    .values
                    .into_iter()
                    .map(|v| v.and_then(|x| self.normalize_value(x)))
                    .collect();
                Observation::new(row.timestamp, values)
            })
            .collect();

        ObservationTable::new(table.source, table.sensors, rows)
    }
}

impl Default for SentinelNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
