use crate::models::CellGrid;
use crate::utils::constants::COL_TAS;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Output variables the pipeline guarantees to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalColumn {
    Tas,
    VisLight,
    UvLight,
    IrLight,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 4] = [
        CanonicalColumn::Tas,
        CanonicalColumn::VisLight,
        CanonicalColumn::UvLight,
        CanonicalColumn::IrLight,
    ];

    /// Name of the working column this variable is projected from
    pub fn working_name(&self) -> &'static str {
        match self {
            CanonicalColumn::Tas => COL_TAS,
            CanonicalColumn::VisLight => "vis_light",
            CanonicalColumn::UvLight => "uv_light",
            CanonicalColumn::IrLight => "ir_light",
        }
    }

    /// Name of the variable in the written dataset
    pub fn output_name(&self) -> &'static str {
        match self {
            CanonicalColumn::Tas => "tas",
            CanonicalColumn::VisLight => "vis_light",
            CanonicalColumn::UvLight => "uv_light",
            CanonicalColumn::IrLight => "ir_light",
        }
    }

    pub fn from_working_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.working_name() == name)
    }

    pub fn units(&self) -> Option<&'static str> {
        match self {
            CanonicalColumn::Tas => Some("K"),
            _ => None,
        }
    }
}

impl std::fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputVariables {
    Scalar(Vec<(CanonicalColumn, Vec<Option<f64>>)>),
    Grid { tas: Vec<CellGrid> },
}

/// Projected, renamed table handed to the serializer
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub hours: Vec<NaiveDateTime>,
    pub variables: OutputVariables,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.variables, OutputVariables::Grid { .. })
    }

    pub fn scalar(&self, column: CanonicalColumn) -> Option<&[Option<f64>]> {
        match &self.variables {
            OutputVariables::Scalar(columns) => columns
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, values)| values.as_slice()),
            OutputVariables::Grid { .. } => None,
        }
    }

    pub fn columns(&self) -> Vec<CanonicalColumn> {
        match &self.variables {
            OutputVariables::Scalar(columns) => columns.iter().map(|(c, _)| *c).collect(),
            OutputVariables::Grid { .. } => vec![CanonicalColumn::Tas],
        }
    }
}
