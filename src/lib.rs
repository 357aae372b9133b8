//! Warehouse Budget - allocation of projected account totals to warehouses
//!
//! This library provides:
//! - Global account tables built from historical and projection sheets
//! - Warehouse-partitioned account tables from the historical sheet
//! - Historical warehouse shares and their application to projected totals
//! - Reconciliation of warehouse accounts missing from the global tables
//! - CSV output of the projection and of the missing accounts

pub mod accounts;
pub mod allocation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sheet;

// Re-export commonly used types
pub use accounts::{AccountRecord, AccountTable, MonthlySeries, WarehouseTable};
pub use allocation::{AllocationMode, MissingEntry, ProjectionTable, ShapeMismatchPolicy, ShareTable};
pub use config::{AnalysisConfig, RangeConfig};
pub use error::{AnalysisError, Result};
pub use pipeline::{AnalysisResult, AnalysisRunner, PipelineContext};
pub use sheet::{Sheet, TabularSource};
