use crate::error::{ProcessingError, Result};
use crate::utils::constants::{GRID_COLS, GRID_ROWS, MINUTES_PER_HOUR};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Lattice cell of each minute of the hour, as written by the station grid layout.
/// Cells (7, 4) through (7, 7) receive no minute.
#[rustfmt::skip]
const STANDARD_CELLS: [(u8, u8); MINUTES_PER_HOUR] = [
    (0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7),
    (1, 0), (1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6), (1, 7),
    (2, 0), (2, 1), (2, 2), (2, 3), (2, 4), (2, 5), (2, 6), (2, 7),
    (3, 0), (3, 1), (3, 2), (3, 3), (3, 4), (3, 5), (3, 6), (3, 7),
    (4, 0), (4, 1), (4, 2), (4, 3), (4, 4), (4, 5), (4, 6), (4, 7),
    (5, 0), (5, 1), (5, 2), (5, 3), (5, 4), (5, 5), (5, 6), (5, 7),
    (6, 0), (6, 1), (6, 2), (6, 3), (6, 4), (6, 5), (6, 6), (6, 7),
    (7, 0), (7, 1), (7, 2), (7, 3),
];

static STANDARD: MappingTable = MappingTable {
    cells: STANDARD_CELLS,
};

/// Immutable minute-of-hour -> (row, col) lookup shared by every grid resampling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    cells: [(u8, u8); MINUTES_PER_HOUR],
}

impl MappingTable {
    pub fn standard() -> &'static MappingTable {
        &STANDARD
    }

    /// Build from exactly 60 `(row, col)` pairs, each inside the 8x8 lattice
    pub fn from_cells(cells: &[(usize, usize)]) -> Result<Self> {
        if cells.len() != MINUTES_PER_HOUR {
            return Err(ProcessingError::Config(format!(
                "Mapping table needs {} entries, got {}",
                MINUTES_PER_HOUR,
                cells.len()
            )));
        }

        let mut table = [(0u8, 0u8); MINUTES_PER_HOUR];
        for (minute, &(row, col)) in cells.iter().enumerate() {
            if row >= GRID_ROWS || col >= GRID_COLS {
                return Err(ProcessingError::Config(format!(
                    "Mapping for minute {} points outside the grid: ({}, {})",
                    minute, row, col
                )));
            }
            table[minute] = (row as u8, col as u8);
        }

        Ok(Self { cells: table })
    }

    /// Load from a JSON array of 60 `[row, col]` pairs
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let cells: Vec<(usize, usize)> = serde_json::from_reader(BufReader::new(file))?;
        Self::from_cells(&cells)
    }

    /// Cell for a minute of the hour.
    ///
    /// # Panics
    ///
    /// Panics if `minute` is 60 or more. Timestamps are validated at parse time, so
    /// such a minute can only come from a caller bug.
    pub fn cell(&self, minute: u32) -> (usize, usize) {
        assert!(
            (minute as usize) < MINUTES_PER_HOUR,
            "minute {} outside 0..60",
            minute
        );
        let (row, col) = self.cells[minute as usize];
        (row as usize, col as usize)
    }

    pub fn is_injective(&self) -> bool {
        let unique: HashSet<_> = self.cells.iter().collect();
        unique.len() == self.cells.len()
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        STANDARD.clone()
    }
}
