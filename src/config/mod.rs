//! Range configuration: which cells of each sheet hold which data

pub mod loader;

pub use loader::{RangeConfig, DEFAULT_CONFIG_PATH};

use crate::error::{AnalysisError, Result};
use crate::sheet::{CellRange, CellRef};

pub const HIST_DATA_FILE_NAME: &str = "HIST_DATA_FILE_NAME";
pub const PROJ_DATA_FILE_NAME: &str = "PROJ_DATA_FILE_NAME";
pub const ACCOUNT_NAME_RANGE: &str = "ACCOUNT_NAME_RANGE";
pub const VOLUME_DATA_RANGE: &str = "VOLUME_DATA_RANGE";
pub const GROSS_MARGIN_RANGE: &str = "GROSS_MARGIN_RANGE";
pub const PROJ_ACCOUNT_NAME_RANGE: &str = "PROJ_ACCOUNT_NAME_RANGE";
pub const PROJ_VOLUME_DATA_RANGE: &str = "PROJ_VOLUME_DATA_RANGE";
pub const PROJ_GROSS_MARGIN_RANGE: &str = "PROJ_GROSS_MARGIN_RANGE";
pub const WAREHOUSE_DATA_STARTING_COORDINATE: &str = "WAREHOUSE_DATA_STARTING_COORDINATE";
pub const VOLUME_LABEL_RANGE: &str = "VOLUME_LABEL_RANGE";
pub const GROSS_MARGIN_LABEL_RANGE: &str = "GROSS_MARGIN_LABEL_RANGE";
pub const TOTAL_ROW_MARKER: &str = "TOTAL_ROW_MARKER";

/// Default marker identifying subtotal rows in the warehouse region
pub const DEFAULT_TOTAL_MARKER: &str = "total";

/// Where the account names and their two series live in one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRanges {
    /// Column of account names, scanned over its rows
    pub names: CellRange,
    /// Volume columns (rows ignored)
    pub volumes: CellRange,
    /// Gross margin columns (rows ignored)
    pub margins: CellRange,
}

/// Fully resolved configuration for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Historical workbook export, if named in the configuration
    pub history_file: Option<String>,
    /// Projection workbook export, if named in the configuration
    pub projection_file: Option<String>,
    pub history: AccountRanges,
    pub projection: AccountRanges,
    /// Top-left cell of the warehouse region (warehouse name column)
    pub warehouse_start: CellRef,
    pub volume_labels: CellRange,
    pub margin_labels: CellRange,
    /// Case-insensitive text marking subtotal rows
    pub total_marker: String,
}

impl AnalysisConfig {
    /// Resolve every range expression in a raw key -> value configuration
    pub fn from_range_config(raw: &RangeConfig) -> Result<Self> {
        let range = |key: &str| -> Result<CellRange> { raw.get(key)?.parse() };

        let history = AccountRanges {
            names: range(ACCOUNT_NAME_RANGE)?,
            volumes: range(VOLUME_DATA_RANGE)?,
            margins: range(GROSS_MARGIN_RANGE)?,
        };
        let projection = AccountRanges {
            names: range(PROJ_ACCOUNT_NAME_RANGE)?,
            volumes: range(PROJ_VOLUME_DATA_RANGE)?,
            margins: range(PROJ_GROSS_MARGIN_RANGE)?,
        };

        let config = Self {
            history_file: raw.get_optional(HIST_DATA_FILE_NAME).map(str::to_string),
            projection_file: raw.get_optional(PROJ_DATA_FILE_NAME).map(str::to_string),
            history,
            projection,
            warehouse_start: raw.get(WAREHOUSE_DATA_STARTING_COORDINATE)?.parse()?,
            volume_labels: range(VOLUME_LABEL_RANGE)?,
            margin_labels: range(GROSS_MARGIN_LABEL_RANGE)?,
            total_marker: raw
                .get_optional(TOTAL_ROW_MARKER)
                .unwrap_or(DEFAULT_TOTAL_MARKER)
                .to_string(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every series and label range has the same number of months
    pub fn validate(&self) -> Result<()> {
        let months = self.history.volumes.width();
        let checks = [
            (GROSS_MARGIN_RANGE, self.history.margins),
            (PROJ_VOLUME_DATA_RANGE, self.projection.volumes),
            (PROJ_GROSS_MARGIN_RANGE, self.projection.margins),
            (VOLUME_LABEL_RANGE, self.volume_labels),
            (GROSS_MARGIN_LABEL_RANGE, self.margin_labels),
        ];

        for (key, range) in checks {
            if range.width() != months {
                return Err(AnalysisError::InvalidRange {
                    range: range.to_string(),
                    reason: format!(
                        "{} spans {} months but {} spans {}",
                        key,
                        range.width(),
                        VOLUME_DATA_RANGE,
                        months
                    ),
                });
            }
        }

        Ok(())
    }

    /// Number of months in every series
    pub fn months(&self) -> usize {
        self.history.volumes.width()
    }
}
