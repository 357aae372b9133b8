//! End-to-end analysis run
//!
//! Builds the global and warehouse tables, runs the share and projection
//! passes, then reconciles missing accounts. All state lives in the
//! [`PipelineContext`] and the returned [`AnalysisResult`], so several runs can
//! coexist in one process.
//!
//! # Example
//! ```ignore
//! let runner = AnalysisRunner::from_config_file("config.txt")?;
//! let history = Sheet::from_csv_path("history.csv")?;
//! let projection = Sheet::from_csv_path("projection.csv")?;
//! let result = runner.run(&history, &projection)?;
//! println!("{} projected rows", result.projection.entry_count());
//! ```

use crate::accounts::{
    build_account_table, build_warehouse_table, AccountTable, TotalRowMatcher, WarehouseTable,
};
use crate::allocation::{
    distinct_pairs, to_projection_table, to_share_table, MissingEntry, ProjectionTable,
    ShapeMismatchPolicy, ShareTable,
};
use crate::config::{AnalysisConfig, RangeConfig};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::sheet::TabularSource;
use serde::Serialize;
use std::path::Path;

/// Everything a run needs besides the two sheets
#[derive(Debug)]
pub struct PipelineContext {
    pub config: AnalysisConfig,
    pub totals: TotalRowMatcher,
    pub shape_policy: ShapeMismatchPolicy,
}

impl PipelineContext {
    /// Context with the configured total-row marker and the default policy
    pub fn new(config: AnalysisConfig) -> Self {
        let totals = TotalRowMatcher::containing(&config.total_marker);
        Self {
            config,
            totals,
            shape_policy: ShapeMismatchPolicy::default(),
        }
    }
}

/// Output of a completed run
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub historical_accounts: AccountTable,
    pub projected_accounts: AccountTable,
    /// Historical warehouse values as read from the sheet
    pub warehouses: WarehouseTable,
    /// Per-month shares of the historical globals
    pub shares: ShareTable,
    /// Projected warehouse values after reconciliation
    pub projection: ProjectionTable,
    /// Missing entries from both passes, in the order they were recorded
    pub missing: Vec<MissingEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub volume_labels: Vec<String>,
    pub margin_labels: Vec<String>,
}

impl AnalysisResult {
    /// Distinct missing (warehouse, account) pairs for the missing-accounts table
    pub fn missing_pairs(&self) -> Vec<(String, String)> {
        distinct_pairs(&self.missing)
    }

    /// Get summary statistics
    pub fn summary(&self, elapsed_secs: f64) -> RunSummary {
        RunSummary {
            historical_accounts: self.historical_accounts.len(),
            projected_accounts: self.projected_accounts.len(),
            warehouses: self.warehouses.len(),
            warehouse_accounts: self.warehouses.entry_count(),
            projected_rows: self.projection.entry_count(),
            missing: self.missing_pairs(),
            diagnostics: self.diagnostics.clone(),
            elapsed_secs,
        }
    }
}

/// Summary statistics for a run, written as JSON on request
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub historical_accounts: usize,
    pub projected_accounts: usize,
    pub warehouses: usize,
    pub warehouse_accounts: usize,
    pub projected_rows: usize,
    pub missing: Vec<(String, String)>,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed_secs: f64,
}

/// Runs the allocation pipeline for one configuration
#[derive(Debug)]
pub struct AnalysisRunner {
    context: PipelineContext,
}

impl AnalysisRunner {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    /// Create runner by loading a `KEY=VALUE` configuration file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = RangeConfig::load(path)?;
        let config = AnalysisConfig::from_range_config(&raw)?;
        Ok(Self::new(PipelineContext::new(config)))
    }

    /// Get reference to the context for inspection
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Get mutable reference to the context for customization
    pub fn context_mut(&mut self) -> &mut PipelineContext {
        &mut self.context
    }

    /// Run the full pipeline; any fatal error aborts without partial output
    pub fn run<H, P>(&self, history: &H, projection: &P) -> Result<AnalysisResult>
    where
        H: TabularSource + ?Sized,
        P: TabularSource + ?Sized,
    {
        let ctx = &self.context;
        let config = &ctx.config;

        let historical_accounts = build_account_table(history, &config.history)?;
        let scan = build_warehouse_table(history, config.warehouse_start, &config.history, &ctx.totals)?;
        let mut diagnostics = scan.diagnostics;

        let share_pass = to_share_table(&scan.table, &historical_accounts, ctx.shape_policy)?;

        let projected_accounts = build_account_table(projection, &config.projection)?;
        let projection_pass =
            to_projection_table(&share_pass.table, &projected_accounts, ctx.shape_policy)?;

        let mut missing = share_pass.missing;
        missing.extend(projection_pass.missing);

        let mut mismatches = share_pass.mismatches;
        mismatches.extend(projection_pass.mismatches);

        let projection_table = projection_pass.table.reconciled(&missing, &mismatches);
        diagnostics.extend(mismatches);

        log::info!(
            "Projected {} warehouse accounts; {} missing entries, {} diagnostics",
            projection_table.entry_count(),
            missing.len(),
            diagnostics.len()
        );

        Ok(AnalysisResult {
            historical_accounts,
            projected_accounts,
            warehouses: scan.table,
            shares: share_pass.table,
            projection: projection_table,
            missing,
            diagnostics,
            volume_labels: history.row_texts(&config.volume_labels),
            margin_labels: history.row_texts(&config.margin_labels),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::allocation::AllocationMode;
    use crate::config::tests::SAMPLE_CONFIG;
    use crate::error::AnalysisError;
    use crate::sheet::Sheet;
    use approx::assert_relative_eq;

    /// Historical sheet laid out for `SAMPLE_CONFIG`
    pub(crate) const HISTORY_CSV: &str = "\
Budget history,,,,,
,Account,Jan vol,Feb vol,Jan gm,Feb gm
,A,60,120,6,12
,B,10,10,1,1
,A,40,80,4,8
,,,,,
Warehouse,Account,,,,
Dallas,A,50,100,5,10
,B,10,10,1,1
Dallas Total,,60,110,6,11
Houston,A,50,100,5,10
,C,1,1,1,1
";

    /// Projection sheet laid out for `SAMPLE_CONFIG`
    pub(crate) const PROJECTION_CSV: &str = "\
Account,Jan,Feb,Jan,Feb
A,300,300,15,15
C,9,9,9,9
";

    pub(crate) fn run_sample() -> AnalysisResult {
        let raw = RangeConfig::from_reader(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = AnalysisConfig::from_range_config(&raw).unwrap();
        let runner = AnalysisRunner::new(PipelineContext::new(config));

        let history = Sheet::from_csv_reader("history", HISTORY_CSV.as_bytes()).unwrap();
        let projection = Sheet::from_csv_reader("projection", PROJECTION_CSV.as_bytes()).unwrap();
        runner.run(&history, &projection).unwrap()
    }

    #[test]
    fn test_global_tables() {
        let result = run_sample();

        assert_eq!(result.historical_accounts.len(), 2);
        let a = result.historical_accounts.get("A").unwrap();
        assert_eq!(a.volume.values(), &[100.0, 200.0]);
        assert_eq!(a.margin.values(), &[10.0, 20.0]);

        assert_eq!(result.projected_accounts.len(), 2);
        assert!(result.projected_accounts.contains("C"));
    }

    #[test]
    fn test_projection_values() {
        let result = run_sample();

        let dallas_a = result.projection.record("Dallas", "A").unwrap();
        assert_eq!(dallas_a.volume.values(), &[150.0, 150.0]);
        assert_eq!(dallas_a.margin.values(), &[7.5, 7.5]);

        let houston_a = result.projection.record("Houston", "A").unwrap();
        assert_relative_eq!(houston_a.volume.values()[1], 150.0);

        // Shares stay inspectable after the projection pass
        let share = result.shares.record("Dallas", "A").unwrap();
        assert_eq!(share.volume.values(), &[0.5, 0.5]);
    }

    #[test]
    fn test_missing_accounts_reconciled() {
        let result = run_sample();

        // B is historical only, C is projected only
        assert!(!result.projection.contains("Dallas", "B"));
        assert!(!result.projection.contains("Houston", "C"));
        assert_eq!(result.projection.entry_count(), 2);

        let passes: Vec<_> = result
            .missing
            .iter()
            .map(|m| (m.warehouse.as_str(), m.account.as_str(), m.pass))
            .collect();
        assert_eq!(
            passes,
            vec![
                ("Houston", "C", AllocationMode::ToShare),
                ("Dallas", "B", AllocationMode::ToProjection),
            ]
        );

        assert_eq!(
            result.missing_pairs(),
            vec![
                ("Houston".to_string(), "C".to_string()),
                ("Dallas".to_string(), "B".to_string()),
            ]
        );

        // The raw warehouse table still holds every observed pair
        assert_eq!(result.warehouses.entry_count(), 4);
    }

    #[test]
    fn test_labels_and_summary() {
        let result = run_sample();
        assert_eq!(result.volume_labels, vec!["Jan vol", "Feb vol"]);
        assert_eq!(result.margin_labels, vec!["Jan gm", "Feb gm"]);

        let summary = result.summary(0.25);
        assert_eq!(summary.warehouses, 2);
        assert_eq!(summary.projected_rows, 2);
        assert_eq!(summary.missing.len(), 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["projected_rows"], 2);
    }

    #[test]
    fn test_bundled_data_directory() {
        let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let runner = AnalysisRunner::from_config_file(data.join("config.txt")).unwrap();
        let config = &runner.context().config;

        let history = Sheet::open(data.join(config.history_file.as_deref().unwrap())).unwrap();
        let projection = Sheet::open(data.join(config.projection_file.as_deref().unwrap())).unwrap();
        let result = runner.run(&history, &projection).unwrap();

        let freight = result.historical_accounts.get("1001 Freight").unwrap();
        assert_eq!(freight.volume.values(), &[1500.0, 1500.0, 1000.0]);

        let dallas_freight = result.projection.record("Dallas", "1001 Freight").unwrap();
        for (value, expected) in dallas_freight.volume.values().iter().zip([1200.0, 1200.0, 1200.0]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-9);
        }
        for value in dallas_freight.margin.values() {
            assert_relative_eq!(*value, 120.0, epsilon = 1e-9);
        }

        let houston_freight = result.projection.record("Houston", "1001 Freight").unwrap();
        assert_relative_eq!(houston_freight.volume.values()[0], 800.0, epsilon = 1e-9);
        assert_relative_eq!(houston_freight.margin.values()[2], 80.0, epsilon = 1e-9);

        // Zero historical March storage keeps the projection at zero
        let dallas_storage = result.projection.record("Dallas", "1002 Storage").unwrap();
        for (value, expected) in dallas_storage.volume.values().iter().zip([125.0, 375.0, 0.0]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-9);
        }
        for (value, expected) in dallas_storage.margin.values().iter().zip([12.5, 37.5, 0.0]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-9);
        }
        let houston_storage = result.projection.record("Houston", "1002 Storage").unwrap();
        assert_relative_eq!(houston_storage.volume.values()[0], 375.0, epsilon = 1e-9);
        assert_relative_eq!(houston_storage.volume.values()[1], 125.0, epsilon = 1e-9);

        // Handling has history but no projection
        assert_eq!(
            result.missing_pairs(),
            vec![("Dallas".to_string(), "1003 Handling".to_string())]
        );
        assert_eq!(result.projection.entry_count(), 4);
        assert_eq!(result.volume_labels, vec!["Jan Vol", "Feb Vol", "Mar Vol"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_error_aborts_run() {
        let raw = RangeConfig::from_reader(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = AnalysisConfig::from_range_config(&raw).unwrap();
        let runner = AnalysisRunner::new(PipelineContext::new(config));

        let history = Sheet::from_csv_reader("history", HISTORY_CSV.as_bytes()).unwrap();
        let broken = PROJECTION_CSV.replace("300,300", "300,three hundred");
        let projection = Sheet::from_csv_reader("projection", broken.as_bytes()).unwrap();

        let err = runner.run(&history, &projection).unwrap_err();
        match err {
            AnalysisError::Parse { sheet, cell, .. } => {
                assert_eq!(sheet, "projection");
                assert_eq!(cell, "C2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
