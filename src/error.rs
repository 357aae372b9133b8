//! Error types for the allocation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot parse '{text}' as a number in sheet '{sheet}' at {cell}")]
    Parse {
        sheet: String,
        cell: String,
        text: String,
    },

    #[error("Series length mismatch for {warehouse} | {account} ({metric}): local has {local_len} months, global has {global_len}")]
    DataShape {
        warehouse: String,
        account: String,
        metric: &'static str,
        local_len: usize,
        global_len: usize,
    },

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("Invalid configuration line {line}: {content}")]
    InvalidConfigLine { line: usize, content: String },

    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),

    #[error("Invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
