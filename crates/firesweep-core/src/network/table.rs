//! Observation tables: rows of discrete states over named columns.

use std::sync::Arc;

use crate::errors::{Result, SweepError};

/// A discrete state value as it appears in observed data.
pub type State = u32;

/// A table of fully observed rows.
///
/// Stored column-major since fitting only ever scans whole columns.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    columns: Vec<Arc<str>>,
    data: Vec<Vec<State>>,
    rows: usize,
}

impl ObservationTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<Arc<str>> = columns.into_iter().map(|c| Arc::from(c.as_ref())).collect();
        let data = vec![Vec::new(); columns.len()];
        Self {
            columns,
            data,
            rows: 0,
        }
    }

    /// Appends one row. The row width must match the column count.
    pub fn push_row(&mut self, row: &[State]) -> Result<()> {
        self.push_repeated(row, 1)
    }

    /// Appends `count` copies of `row`.
    pub fn push_repeated(&mut self, row: &[State], count: usize) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SweepError::Data(format!(
                "row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (col, &value) in self.data.iter_mut().zip(row) {
            col.extend(std::iter::repeat(value).take(count));
        }
        self.rows += count;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Arc<str>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[State]> {
        self.columns
            .iter()
            .position(|c| c.as_ref() == name)
            .map(|i| self.data[i].as_slice())
    }

    pub fn row(&self, index: usize) -> Option<Vec<State>> {
        (index < self.rows).then(|| self.data.iter().map(|c| c[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<State>> + '_ {
        (0..self.rows).map(move |i| self.data.iter().map(|c| c[i]).collect())
    }

    /// Sorted distinct values observed in a column.
    pub fn state_space(&self, name: &str) -> Result<Vec<State>> {
        let column = self
            .column(name)
            .ok_or_else(|| SweepError::Data(format!("unknown column '{}'", name)))?;
        let mut states = column.to_vec();
        states.sort_unstable();
        states.dedup();
        Ok(states)
    }
}
