//! Spreadsheet workbooks (.xls, .xlsx, .xlsm, .xlsb, .ods) read through calamine

use super::Sheet;
use crate::error::{AnalysisError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// File extensions opened as workbooks rather than CSV
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// On-disk layout of a sheet, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// Workbook extensions (case-insensitive) select calamine, anything else is CSV
    pub fn from_path(path: &Path) -> Self {
        let is_workbook = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
            .unwrap_or(false);

        if is_workbook {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }
}

/// Text of a workbook cell as the allocation engine reads it
///
/// Numbers keep their shortest decimal form (`1200`, not `1200.0`). Dates are
/// given as Excel serial numbers. Error cells keep their `#` code so that
/// parsing them fails with the cell position.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string().to_uppercase(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

impl Sheet {
    /// Load the first worksheet of a workbook file
    pub fn from_workbook_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)?;

        let first = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| AnalysisError::Workbook(calamine::Error::Msg("workbook has no worksheets")))?;
        let range = workbook.worksheet_range(&first)?;

        log::debug!("Reading worksheet '{}' of {}", first, path.display());
        Ok(Self::from_range(super::file_label(path), &range))
    }

    /// Build a sheet from a calamine range, keeping absolute A1 positions
    ///
    /// calamine trims leading empty rows and columns; they are restored as
    /// empty cells so configured ranges line up with the workbook.
    pub fn from_range<S: Into<String>>(name: S, range: &Range<Data>) -> Self {
        let (first_row, first_col) = range.start().unwrap_or_default();

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
        for cells in range.rows() {
            let mut row = vec![String::new(); first_col as usize];
            row.extend(cells.iter().map(cell_text));
            rows.push(row);
        }

        let sheet = Self::from_rows(name, rows);
        log::debug!("Loaded sheet '{}' with {} rows", sheet.name, sheet.rows.len());
        sheet
    }
}
