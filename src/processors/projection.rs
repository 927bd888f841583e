use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalColumn, HourlyPayload, HourlyTable, OutputTable, OutputVariables};
use tracing::debug;

/// Reduces an hourly table to the canonical output schema
pub struct ColumnProjection {
    columns: Vec<CanonicalColumn>,
}

impl ColumnProjection {
    pub fn new() -> Self {
        Self {
            columns: CanonicalColumn::ALL.to_vec(),
        }
    }

    /// Keep only the known working columns, renamed to their canonical names.
    ///
    /// In scalar mode, hours whose temperature aggregate is missing are dropped and
    /// the temperature column must exist. Grid mode keeps every hour.
    pub fn project(&self, table: HourlyTable) -> Result<OutputTable> {
        match table.payload {
            HourlyPayload::Grid(grids) => Ok(OutputTable {
                hours: table.hours,
                variables: OutputVariables::Grid { tas: grids },
            }),
            HourlyPayload::Scalar(series) => {
                let mut kept: Vec<(CanonicalColumn, Vec<Option<f64>>)> = Vec::new();
                for column in &self.columns {
                    if let Some(s) = series.iter().find(|s| s.name == column.working_name()) {
                        kept.push((*column, s.values.clone()));
                    }
                }

                let tas_index = kept
                    .iter()
                    .position(|(c, _)| *c == CanonicalColumn::Tas)
                    .ok_or_else(|| {
                        ProcessingError::Config(format!(
                            "Required column '{}' missing after projection",
                            CanonicalColumn::Tas
                        ))
                    })?;

                let keep: Vec<bool> = kept[tas_index].1.iter().map(Option::is_some).collect();
                let dropped = keep.iter().filter(|k| !**k).count();
                if dropped > 0 {
                    debug!("Dropping {} hours without a temperature aggregate", dropped);
                }

                let hours = retain_by_mask(table.hours, &keep);
                let variables = kept
                    .into_iter()
                    .map(|(column, values)| (column, retain_by_mask(values, &keep)))
                    .collect();

                Ok(OutputTable {
                    hours,
                    variables: OutputVariables::Scalar(variables),
                })
            }
        }
    }
}

impl Default for ColumnProjection {
    fn default() -> Self {
        Self::new()
    }
}

fn retain_by_mask<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(value, &k)| k.then_some(value))
        .collect()
}
