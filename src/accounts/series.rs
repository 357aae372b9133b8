//! Monthly series and extraction of a row of numeric cells

use crate::error::{AnalysisError, Result};
use crate::sheet::{CellRef, TabularSource};
use serde::{Deserialize, Serialize};

/// One value per reporting month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlySeries(Vec<f64>);

impl MonthlySeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Element-wise sum into `self`; both series come from the same configured
    /// columns so their lengths agree
    pub fn accumulate(&mut self, other: &MonthlySeries) {
        debug_assert_eq!(self.len(), other.len());
        for (total, value) in self.0.iter_mut().zip(other.0.iter()) {
            *total += value;
        }
    }

    /// Combine with a series of the same length month by month
    pub fn zip_with<F>(&self, other: &MonthlySeries, f: F) -> MonthlySeries
    where
        F: Fn(f64, f64) -> f64,
    {
        MonthlySeries(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        )
    }
}

impl From<Vec<f64>> for MonthlySeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Strip thousands separators, currency markers and quotes from a cell
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ',' | '$' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse one cell; blank cells are zero
pub fn parse_cell<S: TabularSource + ?Sized>(source: &S, row: usize, col: usize) -> Result<f64> {
    let raw = source.cell_text(row, col);
    let clean = sanitize(raw);
    if clean.is_empty() {
        return Ok(0.0);
    }

    clean.parse::<f64>().map_err(|_| AnalysisError::Parse {
        sheet: source.name().to_string(),
        cell: CellRef::new(row, col).to_string(),
        text: raw.to_string(),
    })
}

/// Read columns `start_col..=end_col` of `row` into a series
pub fn extract<S: TabularSource + ?Sized>(
    source: &S,
    start_col: usize,
    end_col: usize,
    row: usize,
) -> Result<MonthlySeries> {
    (start_col..=end_col)
        .map(|col| parse_cell(source, row, col))
        .collect::<Result<Vec<_>>>()
        .map(MonthlySeries)
}
