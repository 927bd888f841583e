use chrono::NaiveDateTime;

/// A table in the original log schema, sentinels restored, ready to be written back out
#[derive(Debug, Clone, PartialEq)]
pub struct LogTable {
    pub columns: Vec<String>,
    pub rows: Vec<LogRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<f64>,
}

impl LogTable {
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
