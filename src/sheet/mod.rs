//! Tabular input sources
//!
//! The allocation engine only sees the [`TabularSource`] trait: text lookup by
//! (row, column), A1 resolution and a row count. [`Sheet`] is the in-memory
//! implementation, loaded either from the historical and projection workbooks
//! themselves or from CSV exports of them.

mod reference;
mod workbook;

pub use reference::{column_letters, CellRange, CellRef};
pub use workbook::SheetFormat;

use crate::error::Result;
use csv::ReaderBuilder;
use std::path::Path;

/// Read-only grid of text cells
pub trait TabularSource {
    /// Name used in error messages and logs
    fn name(&self) -> &str;

    /// Text content of a cell; out-of-bounds cells are empty
    fn cell_text(&self, row: usize, col: usize) -> &str;

    /// Number of rows in the source
    fn row_count(&self) -> usize;

    /// Resolve an A1 reference such as `"B7"` to its position
    fn resolve(&self, reference: &str) -> Result<CellRef> {
        reference.parse()
    }

    /// Resolve a `"<cell>:<cell>"` or single-cell range expression
    fn resolve_range(&self, range: &str) -> Result<CellRange> {
        range.parse()
    }

    /// Texts of the cells in a single row of a range (e.g. month labels)
    fn row_texts(&self, range: &CellRange) -> Vec<String> {
        (range.start_col()..=range.end_col())
            .map(|col| self.cell_text(range.start_row(), col).to_string())
            .collect()
    }
}

/// A grid of cells held in memory
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Build a sheet from explicit rows
    pub fn from_rows<S: Into<String>>(name: S, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Load a sheet, choosing the reader from the file extension
    ///
    /// Workbook files read their first worksheet; anything else is parsed as CSV.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match SheetFormat::from_path(path) {
            SheetFormat::Workbook => Self::from_workbook_path(path),
            SheetFormat::Csv => Self::from_csv_path(path),
        }
    }

    /// Load a sheet from a CSV file; every line is a row, no header row
    ///
    /// The CSV reader skips lines that are completely empty, which shifts the
    /// A1 positions of later rows. Empty sheet rows must be exported as
    /// delimiter-only lines (`,,,`).
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file_label(path), file)
    }

    /// Load a sheet from any CSV reader (e.g., string buffer in tests)
    pub fn from_csv_reader<S: Into<String>, R: std::io::Read>(name: S, reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let sheet = Self::from_rows(name, rows);
        log::debug!("Loaded sheet '{}' with {} rows", sheet.name, sheet.rows.len());
        Ok(sheet)
    }
}

/// Sheet name used in messages: the file name, or the whole path without one
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl TabularSource for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn cell_text(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}
