//! Hourly bucketing of per-minute readings.
//!
//! Readings are grouped by the calendar hour containing their timestamp. The output
//! always covers every hour from the first to the last input hour, so hours without
//! readings appear as entirely missing rows.

use crate::models::{CellGrid, HourlyPayload, HourlyTable, NamedSeries, WorkingTable};
use crate::processors::mapping::MappingTable;
use crate::utils::constants::{COL_TAS, MAX_UNRELIABLE_DISTINCT};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMode {
    /// One aggregate per hour and column
    Scalar,
    /// Target quantity placed on the 8x8 lattice
    Grid,
}

impl ResampleMode {
    pub fn from_hourly(hourly: bool) -> Self {
        if hourly {
            ResampleMode::Scalar
        } else {
            ResampleMode::Grid
        }
    }
}

pub struct TemporalResampler<'a> {
    mode: ResampleMode,
    mapping: &'a MappingTable,
}

impl<'a> TemporalResampler<'a> {
    pub fn new(mode: ResampleMode, mapping: &'a MappingTable) -> Self {
        Self { mode, mapping }
    }

    pub fn scalar() -> TemporalResampler<'static> {
        TemporalResampler::new(ResampleMode::Scalar, MappingTable::standard())
    }

    pub fn grid(mapping: &'a MappingTable) -> Self {
        Self::new(ResampleMode::Grid, mapping)
    }

    pub fn mode(&self) -> ResampleMode {
        self.mode
    }

    pub fn resample(&self, table: &WorkingTable) -> HourlyTable {
        let (hours, buckets) = bucket_by_hour(table);

        let payload = match self.mode {
            ResampleMode::Scalar => HourlyPayload::Scalar(self.aggregate(table, &buckets)),
            ResampleMode::Grid => HourlyPayload::Grid(self.place(table, &buckets)),
        };

        HourlyTable { hours, payload }
    }

    fn aggregate(&self, table: &WorkingTable, buckets: &[Vec<usize>]) -> Vec<NamedSeries> {
        let mut series = Vec::with_capacity(table.sensors.len() + 1);

        let tas = buckets
            .iter()
            .map(|rows| aggregate_bucket(rows.iter().map(|&i| table.rows[i].tas)))
            .collect();
        series.push(NamedSeries::new(COL_TAS, tas));

        for (column, name) in table.sensors.iter().enumerate() {
            if name == COL_TAS {
                continue;
            }
            let values = buckets
                .iter()
                .map(|rows| aggregate_bucket(rows.iter().map(|&i| table.rows[i].sensors[column])))
                .collect();
            series.push(NamedSeries::new(name.clone(), values));
        }

        series
    }

    fn place(&self, table: &WorkingTable, buckets: &[Vec<usize>]) -> Vec<CellGrid> {
        buckets
            .iter()
            .map(|rows| {
                let mut grid = CellGrid::new();
                // Rows are in arrival order, so the last reading for a cell wins
                for &i in rows {
                    let reading = &table.rows[i];
                    let (row, col) = self.mapping.cell(reading.timestamp.minute());
                    grid.set(row, col, reading.tas);
                }
                grid
            })
            .collect()
    }
}

/// Start of the calendar hour containing `timestamp`
pub fn truncate_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(timestamp.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    NaiveDateTime::new(timestamp.date(), time)
}

/// Contiguous hour axis covering the input, and per hour the row indices in arrival order
pub fn bucket_by_hour(table: &WorkingTable) -> (Vec<NaiveDateTime>, Vec<Vec<usize>>) {
    let Some(first) = table.rows.iter().map(|r| truncate_to_hour(r.timestamp)).min() else {
        return (Vec::new(), Vec::new());
    };
    let last = table
        .rows
        .iter()
        .map(|r| truncate_to_hour(r.timestamp))
        .max()
        .unwrap_or(first);

    let span = (last - first).num_hours() as usize + 1;
    let hours: Vec<NaiveDateTime> = (0..span)
        .map(|h| first + Duration::hours(h as i64))
        .collect();

    let mut buckets = vec![Vec::new(); span];
    for (i, reading) in table.rows.iter().enumerate() {
        let offset = (truncate_to_hour(reading.timestamp) - first).num_hours() as usize;
        buckets[offset].push(i);
    }

    (hours, buckets)
}

/// Mean of the non-missing values, or missing when they hold two or fewer distinct values.
///
/// A stuck sensor repeating one value, or an hour with only one or two readings, is
/// reported as missing rather than averaged.
pub fn aggregate_bucket<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut distinct = HashSet::new();
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in values.into_iter().flatten() {
        // fold -0.0 into 0.0 so both count as one value
        let key = if value == 0.0 { 0.0f64 } else { value };
        distinct.insert(key.to_bits());
        sum += value;
        count += 1;
    }

    if distinct.len() <= MAX_UNRELIABLE_DISTINCT {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkingReading;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn working(readings: &[(u32, u32, Option<f64>)]) -> WorkingTable {
        WorkingTable::new(
            vec!["mcp9808".to_string()],
            readings
                .iter()
                .map(|&(h, m, tas)| WorkingReading::new(ts(h, m), tas, vec![tas.map(|k| k - 273.15)]))
                .collect(),
        )
    }

    #[test]
    fn test_aggregate_two_distinct_is_missing() {
        assert_eq!(aggregate_bucket([Some(20.0), Some(20.0), Some(21.0)]), None);
        assert_eq!(aggregate_bucket([Some(20.0)]), None);
        assert_eq!(aggregate_bucket(Vec::<Option<f64>>::new()), None);
        assert_eq!(aggregate_bucket([None, None, None]), None);
    }

    #[test]
    fn test_aggregate_three_distinct_is_mean() {
        assert_eq!(aggregate_bucket([Some(20.0), Some(21.0), Some(22.0)]), Some(21.0));
        // Duplicates count toward the mean once dispersion is established
        assert_eq!(
            aggregate_bucket([Some(20.0), Some(20.0), Some(21.0), Some(23.0), None]),
            Some(21.0)
        );
    }

    #[test]
    fn test_aggregate_signed_zero_is_one_value() {
        assert_eq!(aggregate_bucket([Some(0.0), Some(-0.0), Some(1.0)]), None);
    }

    #[test]
    fn test_truncate_to_hour() {
        assert_eq!(truncate_to_hour(ts(13, 59)), ts(13, 0));
        assert_eq!(truncate_to_hour(ts(0, 0)), ts(0, 0));
    }

    #[test]
    fn test_scalar_mode_buckets() {
        let table = working(&[
            (10, 0, Some(293.15)),
            (10, 20, Some(294.15)),
            (10, 40, Some(295.15)),
            (11, 0, Some(293.15)),
        ]);
        let hourly = TemporalResampler::scalar().resample(&table);

        assert_eq!(hourly.hours, vec![ts(10, 0), ts(11, 0)]);
        let tas = hourly.series("tas").unwrap();
        assert!((tas.values[0].unwrap() - 294.15).abs() < 1e-9);
        assert_eq!(tas.values[1], None);

        let raw = hourly.series("mcp9808").unwrap();
        assert!((raw.values[0].unwrap() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_mode_contiguous_axis() {
        let table = working(&[(0, 5, Some(280.0)), (1, 10, Some(281.0)), (3, 15, Some(283.0))]);
        let hourly = TemporalResampler::grid(MappingTable::standard()).resample(&table);

        assert_eq!(hourly.len(), 4);
        assert_eq!(hourly.hours[2], ts(2, 0));
        let grids = hourly.grids().unwrap();
        assert!(grids[2].is_empty());
        assert_eq!(grids[0].get(0, 5), Some(280.0));
        assert_eq!(grids[3].get(1, 7), Some(283.0));
    }

    #[test]
    fn test_grid_mode_last_write_wins() {
        let cells: Vec<(usize, usize)> = (0..60).map(|_| (2, 2)).collect();
        let mapping = MappingTable::from_cells(&cells).unwrap();
        // Arrival order, not time order, decides the winner
        let table = working(&[(10, 50, Some(290.0)), (10, 10, Some(291.0))]);
        let hourly = TemporalResampler::grid(&mapping).resample(&table);

        let grid = &hourly.grids().unwrap()[0];
        assert_eq!(grid.get(2, 2), Some(291.0));
        assert_eq!(grid.filled_count(), 1);
    }

    #[test]
    fn test_empty_input_has_no_hours() {
        let hourly = TemporalResampler::scalar().resample(&WorkingTable::default());
        assert!(hourly.is_empty());
    }
}
