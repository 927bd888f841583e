use crate::utils::constants::{GRID_COLS, GRID_ROWS};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 8x8 lattice of readings for one hour; `None` marks an empty cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    cells: [[Option<f64>; GRID_COLS]; GRID_ROWS],
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl CellGrid {
    /// A grid with every cell missing
    pub fn new() -> Self {
        Self {
            cells: [[None; GRID_COLS]; GRID_ROWS],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row][col]
    }

    /// Place a value, replacing whatever the cell held. Returns true when a value was replaced.
    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) -> bool {
        let replaced = self.cells[row][col].is_some();
        self.cells[row][col] = value;
        replaced
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }

    pub fn rows(&self) -> &[[Option<f64>; GRID_COLS]; GRID_ROWS] {
        &self.cells
    }

    /// Cells flattened row by row
    pub fn iter_row_major(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }
}

/// One working column aggregated to hourly values
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HourlyPayload {
    /// Scalar mode: one aggregate per hour for each working column
    Scalar(Vec<NamedSeries>),
    /// Grid mode: the target quantity placed on the lattice
    Grid(Vec<CellGrid>),
}

/// Resampler output: one row per calendar hour, contiguous from first to last input hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyTable {
    pub hours: Vec<NaiveDateTime>,
    pub payload: HourlyPayload,
}

impl HourlyTable {
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.payload, HourlyPayload::Grid(_))
    }

    pub fn series(&self, name: &str) -> Option<&NamedSeries> {
        match &self.payload {
            HourlyPayload::Scalar(series) => series.iter().find(|s| s.name == name),
            HourlyPayload::Grid(_) => None,
        }
    }

    pub fn grids(&self) -> Option<&[CellGrid]> {
        match &self.payload {
            HourlyPayload::Grid(grids) => Some(grids),
            HourlyPayload::Scalar(_) => None,
        }
    }
}
