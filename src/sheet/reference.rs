//! A1-style cell references and rectangular ranges
//!
//! Rows and columns are 0-indexed internally; the A1 text form is 1-indexed
//! (`A1` is row 0, column 0).

use crate::error::{AnalysisError, Result};
use std::fmt;
use std::str::FromStr;

/// A single cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let clean = s.trim().replace('$', "");
        let invalid = || AnalysisError::InvalidCellReference(s.to_string());

        let split = clean
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = clean.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut col = 0usize;
        for ch in letters.chars() {
            let value = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(value))
                .ok_or_else(invalid)?;
        }

        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self::new(row - 1, col - 1))
    }
}

/// Convert a 0-indexed column to its spreadsheet letters (0 -> A, 26 -> AA)
pub fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Rectangular region between two corners (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn start_col(&self) -> usize {
        self.start.col
    }

    pub fn end_col(&self) -> usize {
        self.end.col
    }

    pub fn start_row(&self) -> usize {
        self.start.row
    }

    /// Number of columns spanned by the range
    pub fn width(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    /// Rows covered, in order
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start.row..=self.end.row
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = AnalysisError;

    /// Accepts `"B3:M3"` or a single `"B3"`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let first = parts.next().unwrap_or("");
        let second = parts.next().unwrap_or(first);
        if parts.next().is_some() {
            return Err(AnalysisError::InvalidRange {
                range: s.to_string(),
                reason: "expected at most one ':'".to_string(),
            });
        }

        let start: CellRef = first.parse()?;
        let end: CellRef = second.parse()?;

        if end.row < start.row || end.col < start.col {
            return Err(AnalysisError::InvalidRange {
                range: s.to_string(),
                reason: "end cell precedes start cell".to_string(),
            });
        }

        Ok(Self { start, end })
    }
}
