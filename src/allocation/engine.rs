//! Share and projection passes over the warehouse table
//!
//! Each pass reads a warehouse table and a global account table and returns a
//! new table; the input is never modified, so the share values stay available
//! after the projection has been computed.

use crate::accounts::{AccountRecord, AccountTable, MonthlySeries, WarehouseTable};
use crate::diagnostics::Diagnostic;
use crate::error::{AnalysisError, Result};
use serde::Serialize;
use std::fmt;
use std::ops::Deref;

/// Direction of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AllocationMode {
    /// local / global: warehouse share of the company-wide value
    ToShare,
    /// share * global: warehouse slice of the projected value
    ToProjection,
}

impl AllocationMode {
    /// Monthly conversion with the zero-global guard
    pub fn convert(self, local: f64, global: f64) -> f64 {
        if global == 0.0 {
            return 0.0;
        }
        match self {
            AllocationMode::ToShare => local / global,
            AllocationMode::ToProjection => local * global,
        }
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationMode::ToShare => write!(f, "share"),
            AllocationMode::ToProjection => write!(f, "projection"),
        }
    }
}

/// What to do when local and global series lengths differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeMismatchPolicy {
    /// Fail the pass with `AnalysisError::DataShape`
    #[default]
    Abort,
    /// Record a diagnostic and drop the pair at reconciliation
    Exclude,
}

/// A warehouse account with no counterpart in the global table of a pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MissingEntry {
    pub warehouse: String,
    pub account: String,
    pub pass: AllocationMode,
}

/// Warehouse table holding per-month shares
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShareTable(WarehouseTable);

/// Warehouse table holding projected absolute values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionTable(WarehouseTable);

impl ProjectionTable {
    /// Remove every missing or excluded pair
    pub fn reconciled(mut self, missing: &[MissingEntry], excluded: &[Diagnostic]) -> Self {
        super::reconcile(&mut self.0, missing);
        super::exclude_mismatched(&mut self.0, excluded);
        self
    }
}

impl Deref for ShareTable {
    type Target = WarehouseTable;

    fn deref(&self) -> &WarehouseTable {
        &self.0
    }
}

impl Deref for ProjectionTable {
    type Target = WarehouseTable;

    fn deref(&self) -> &WarehouseTable {
        &self.0
    }
}

/// Output of one pass
#[derive(Debug, Clone, Default)]
pub struct Allocation<T> {
    pub table: T,
    pub missing: Vec<MissingEntry>,
    /// Shape mismatches recorded under `ShapeMismatchPolicy::Exclude`
    pub mismatches: Vec<Diagnostic>,
}

impl<T> Allocation<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Allocation<U> {
        Allocation {
            table: f(self.table),
            missing: self.missing,
            mismatches: self.mismatches,
        }
    }
}

/// Convert warehouse values into shares of the historical global totals
pub fn to_share_table(
    warehouses: &WarehouseTable,
    global: &AccountTable,
    policy: ShapeMismatchPolicy,
) -> Result<Allocation<ShareTable>> {
    allocate(warehouses, global, AllocationMode::ToShare, policy).map(|a| a.map(ShareTable))
}

/// Apply shares to the projected global totals
pub fn to_projection_table(
    shares: &ShareTable,
    global: &AccountTable,
    policy: ShapeMismatchPolicy,
) -> Result<Allocation<ProjectionTable>> {
    allocate(&shares.0, global, AllocationMode::ToProjection, policy).map(|a| a.map(ProjectionTable))
}

/// Run one pass over every (warehouse, account) pair
///
/// Pairs whose account is not in `global` are recorded as missing and copied
/// unchanged. For the others each month becomes `mode.convert(local, global)`.
pub fn allocate(
    warehouses: &WarehouseTable,
    global: &AccountTable,
    mode: AllocationMode,
    policy: ShapeMismatchPolicy,
) -> Result<Allocation<WarehouseTable>> {
    let mut result = Allocation::<WarehouseTable>::default();

    for (warehouse, accounts) in warehouses.iter() {
        let bucket = result.table.bucket_mut(warehouse);

        for (account, local) in accounts.iter() {
            let Some(global_record) = global.get(account) else {
                log::info!("No global {} account for {} | {}", mode, warehouse, account);
                result.missing.push(MissingEntry {
                    warehouse: warehouse.clone(),
                    account: account.clone(),
                    pass: mode,
                });
                bucket.insert(account.clone(), local.clone());
                continue;
            };

            match check_shape(warehouse, account, local, global_record) {
                Ok(()) => {
                    let converted = AccountRecord::new(
                        convert_series(&local.volume, &global_record.volume, mode),
                        convert_series(&local.margin, &global_record.margin, mode),
                    );
                    bucket.insert(account.clone(), converted);
                }
                Err(err) => match (policy, err) {
                    (
                        ShapeMismatchPolicy::Exclude,
                        AnalysisError::DataShape {
                            warehouse,
                            account,
                            metric,
                            local_len,
                            global_len,
                        },
                    ) => {
                        log::warn!(
                            "Excluding {} | {}: {} length {} != {}",
                            warehouse, account, metric, local_len, global_len
                        );
                        bucket.insert(account.clone(), local.clone());
                        result.mismatches.push(Diagnostic::ShapeMismatch {
                            warehouse,
                            account,
                            metric,
                            local_len,
                            global_len,
                        });
                    }
                    (_, err) => return Err(err),
                },
            }
        }
    }

    log::debug!(
        "{} pass: {} pairs, {} missing, {} mismatched",
        mode,
        result.table.entry_count(),
        result.missing.len(),
        result.mismatches.len()
    );

    Ok(result)
}

fn check_shape(
    warehouse: &str,
    account: &str,
    local: &AccountRecord,
    global: &AccountRecord,
) -> Result<()> {
    let metrics = [
        ("volume", &local.volume, &global.volume),
        ("margin", &local.margin, &global.margin),
    ];

    for (metric, l, g) in metrics {
        if l.len() != g.len() {
            return Err(AnalysisError::DataShape {
                warehouse: warehouse.to_string(),
                account: account.to_string(),
                metric,
                local_len: l.len(),
                global_len: g.len(),
            });
        }
    }

    Ok(())
}

fn convert_series(local: &MonthlySeries, global: &MonthlySeries, mode: AllocationMode) -> MonthlySeries {
    local.zip_with(global, |l, g| mode.convert(l, g))
}
