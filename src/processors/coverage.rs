use crate::models::{HourlyTable, OutputTable, WorkingTable};
use crate::processors::mapping::MappingTable;
use crate::processors::resampler::bucket_by_hour;
use chrono::Timelike;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub readings: usize,
    pub missing_readings: usize,
    pub hours: usize,
    pub hours_with_data: usize,
    /// Grid mode only: readings that overwrote an earlier reading's cell in the same hour
    pub collisions: usize,
    /// Scalar mode only: hours removed by projection
    pub dropped_rows: usize,
    pub grid: bool,
}

pub struct CoverageChecker<'a> {
    mapping: Option<&'a MappingTable>,
}

impl<'a> CoverageChecker<'a> {
    pub fn scalar() -> Self {
        Self { mapping: None }
    }

    pub fn grid(mapping: &'a MappingTable) -> Self {
        Self {
            mapping: Some(mapping),
        }
    }

    /// Tally coverage across the working, hourly and projected stages of one run
    pub fn check(
        &self,
        working: &WorkingTable,
        hourly: &HourlyTable,
        output: &OutputTable,
    ) -> CoverageReport {
        let missing_readings = working.rows.iter().filter(|r| r.tas.is_none()).count();

        let hours_with_data = match hourly.grids() {
            Some(grids) => grids.iter().filter(|g| !g.is_empty()).count(),
            None => output.len(),
        };

        let collisions = self
            .mapping
            .map(|mapping| count_collisions(working, mapping))
            .unwrap_or(0);

        CoverageReport {
            readings: working.len(),
            missing_readings,
            hours: hourly.len(),
            hours_with_data,
            collisions,
            dropped_rows: hourly.len().saturating_sub(output.len()),
            grid: self.mapping.is_some(),
        }
    }
}

impl CoverageReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Coverage Report ===\n");
        summary.push_str(&format!("Readings: {}\n", self.readings));
        summary.push_str(&format!(
            "Missing Readings: {} ({:.1}%)\n",
            self.missing_readings,
            percent(self.missing_readings, self.readings)
        ));
        summary.push_str(&format!("Hours: {}\n", self.hours));
        summary.push_str(&format!(
            "Hours With Data: {} ({:.1}%)\n",
            self.hours_with_data,
            percent(self.hours_with_data, self.hours)
        ));

        if self.grid {
            summary.push_str(&format!("Cell Collisions: {}\n", self.collisions));
        } else {
            summary.push_str(&format!("Dropped Hours: {}\n", self.dropped_rows));
        }

        summary
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn count_collisions(working: &WorkingTable, mapping: &MappingTable) -> usize {
    let (_, buckets) = bucket_by_hour(working);

    buckets
        .iter()
        .map(|rows| {
            let mut seen = HashSet::new();
            rows.iter()
                .filter(|&&i| !seen.insert(mapping.cell(working.rows[i].timestamp.minute())))
                .count()
        })
        .sum()
}
