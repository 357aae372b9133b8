//! Recoverable input-quality findings collected during a run

use serde::Serialize;
use std::fmt;

/// A condition that was recorded and skipped rather than aborting the run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// An account row appeared before any warehouse header established a bucket
    MalformedWarehouseBlock {
        row: usize,
        warehouse: Option<String>,
        account: String,
    },
    /// Local and global series lengths differ; the pair was excluded
    ShapeMismatch {
        warehouse: String,
        account: String,
        metric: &'static str,
        local_len: usize,
        global_len: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedWarehouseBlock { row, warehouse, account } => write!(
                f,
                "row {}: account '{}' has no warehouse bucket (cursor: {})",
                row + 1,
                account,
                warehouse.as_deref().unwrap_or("<none>")
            ),
            Diagnostic::ShapeMismatch {
                warehouse,
                account,
                metric,
                local_len,
                global_len,
            } => write!(
                f,
                "{} | {}: {} has {} months locally, {} globally",
                warehouse, account, metric, local_len, global_len
            ),
        }
    }
}
