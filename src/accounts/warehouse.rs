//! Warehouse-partitioned account data
//!
//! The historical sheet lists warehouses in visual blocks: a header row with
//! the warehouse name (and usually its first account), followed by account
//! rows whose warehouse cell is blank. Subtotal rows are interleaved and
//! carry no per-warehouse detail.

use super::table::{AccountRecord, AccountTable};
use crate::config::AccountRanges;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::sheet::{CellRef, TabularSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Warehouse name -> account table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WarehouseTable {
    warehouses: BTreeMap<String, AccountTable>,
}

impl WarehouseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, warehouse: &str) -> Option<&AccountTable> {
        self.warehouses.get(warehouse)
    }

    pub fn get_mut(&mut self, warehouse: &str) -> Option<&mut AccountTable> {
        self.warehouses.get_mut(warehouse)
    }

    /// Record for a (warehouse, account) pair
    pub fn record(&self, warehouse: &str, account: &str) -> Option<&AccountRecord> {
        self.get(warehouse).and_then(|accounts| accounts.get(account))
    }

    pub fn contains(&self, warehouse: &str, account: &str) -> bool {
        self.record(warehouse, account).is_some()
    }

    /// Bucket for a warehouse, created empty if absent
    pub fn bucket_mut(&mut self, warehouse: &str) -> &mut AccountTable {
        self.warehouses.entry(warehouse.to_string()).or_default()
    }

    /// Insert or overwrite a (warehouse, account) record
    pub fn insert(&mut self, warehouse: &str, account: &str, record: AccountRecord) {
        self.bucket_mut(warehouse).insert(account, record);
    }

    /// Remove a (warehouse, account) pair; absent pairs are a no-op
    pub fn remove(&mut self, warehouse: &str, account: &str) -> Option<AccountRecord> {
        self.warehouses
            .get_mut(warehouse)
            .and_then(|accounts| accounts.remove(account))
    }

    /// Number of warehouses, including any with no accounts
    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }

    /// Number of (warehouse, account) pairs
    pub fn entry_count(&self) -> usize {
        self.warehouses.values().map(AccountTable::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AccountTable)> {
        self.warehouses.iter()
    }

    /// Every (warehouse, account, record) triple in output order
    pub fn entries(&self) -> impl Iterator<Item = (&String, &String, &AccountRecord)> {
        self.warehouses.iter().flat_map(|(warehouse, accounts)| {
            accounts
                .iter()
                .map(move |(account, record)| (warehouse, account, record))
        })
    }
}

impl FromIterator<(String, AccountTable)> for WarehouseTable {
    fn from_iter<I: IntoIterator<Item = (String, AccountTable)>>(iter: I) -> Self {
        Self {
            warehouses: iter.into_iter().collect(),
        }
    }
}

/// Decides whether a warehouse-name cell marks a subtotal row
pub struct TotalRowMatcher {
    predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl TotalRowMatcher {
    /// Case-insensitive substring match on `marker`
    pub fn containing(marker: &str) -> Self {
        let marker = marker.to_lowercase();
        Self::from_fn(move |name| name.to_lowercase().contains(&marker))
    }

    /// Arbitrary predicate
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    pub fn is_total(&self, name: &str) -> bool {
        (self.predicate)(name)
    }
}

impl Default for TotalRowMatcher {
    fn default() -> Self {
        Self::containing(crate::config::DEFAULT_TOTAL_MARKER)
    }
}

impl fmt::Debug for TotalRowMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotalRowMatcher").finish_non_exhaustive()
    }
}

/// Result of scanning the warehouse region
#[derive(Debug, Clone, Default)]
pub struct WarehouseScan {
    pub table: WarehouseTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan the warehouse region from `start` to the last row of the sheet
///
/// The warehouse name is read from `start`'s column and the account name from
/// the column right after it. Series columns come from `ranges`; only its
/// volume and margin columns are used.
pub fn build_warehouse_table<S: TabularSource + ?Sized>(
    source: &S,
    start: CellRef,
    ranges: &AccountRanges,
    totals: &TotalRowMatcher,
) -> Result<WarehouseScan> {
    let warehouse_col = start.col;
    let account_col = start.col + 1;

    let mut scan = WarehouseScan::default();
    let mut current: Option<String> = None;

    for row in start.row..source.row_count() {
        let warehouse = source.cell_text(row, warehouse_col).trim();
        let account = source.cell_text(row, account_col).trim();

        if warehouse.is_empty() {
            if account.is_empty() {
                continue;
            }

            // Continuation row: belongs to the warehouse of the last header
            let bucket = current
                .as_deref()
                .and_then(|name| scan.table.get_mut(name));
            match bucket {
                Some(accounts) => {
                    let record = AccountRecord::extract(source, ranges, row)?;
                    accounts.insert(account, record);
                }
                None => {
                    log::warn!(
                        "Sheet '{}' row {}: account '{}' precedes any warehouse header",
                        source.name(),
                        row + 1,
                        account
                    );
                    scan.diagnostics.push(Diagnostic::MalformedWarehouseBlock {
                        row,
                        warehouse: current.clone(),
                        account: account.to_string(),
                    });
                }
            }
        } else if totals.is_total(warehouse) {
            log::trace!("Skipping total row {}: {}", row + 1, warehouse);
        } else {
            current = Some(warehouse.to_string());
            let bucket = scan.table.bucket_mut(warehouse);

            if account.is_empty() {
                log::debug!("Warehouse header without account: {}", warehouse);
            } else {
                let record = AccountRecord::extract(source, ranges, row)?;
                bucket.insert(account, record);
            }
        }
    }

    log::info!(
        "Sheet '{}': {} warehouses, {} warehouse accounts",
        source.name(),
        scan.table.len(),
        scan.table.entry_count()
    );

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::sheet::Sheet;

    fn ranges() -> AccountRanges {
        AccountRanges {
            names: "B1:B1".parse().unwrap(),
            volumes: "C1:D1".parse().unwrap(),
            margins: "E1:F1".parse().unwrap(),
        }
    }

    fn scan(csv: &str) -> WarehouseScan {
        let sheet = Sheet::from_csv_reader("history", csv.as_bytes()).unwrap();
        build_warehouse_table(&sheet, CellRef::new(1, 0), &ranges(), &TotalRowMatcher::default())
            .unwrap()
    }

    #[test]
    fn test_groups_rows_under_header() {
        let result = scan(
            "\
Warehouse,Account,Jan,Feb,Jan,Feb
Dallas,Freight,50,100,5,10
,Storage,1,2,3,4
Houston,Freight,7,8,9,10
",
        );

        let table = &result.table;
        assert_eq!(table.len(), 2);
        assert_eq!(table.entry_count(), 3);
        assert_eq!(
            table.record("Dallas", "Freight").unwrap().volume.values(),
            &[50.0, 100.0]
        );
        assert_eq!(
            table.record("Dallas", "Storage").unwrap().margin.values(),
            &[3.0, 4.0]
        );
        assert!(table.contains("Houston", "Freight"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_total_rows_skipped_and_cursor_kept() {
        let result = scan(
            "\
Warehouse,Account,Jan,Feb,Jan,Feb
Dallas,Freight,50,100,5,10
Dallas TOTAL,,50,100,5,10
,Storage,1,2,3,4
Grand Total,Freight,999,999,999,999
",
        );

        let table = &result.table;
        assert_eq!(table.len(), 1);
        assert!(table.get("Dallas TOTAL").is_none());
        assert!(table.get("Grand Total").is_none());
        // Continuation after a total row stays with the last real warehouse
        assert!(table.contains("Dallas", "Storage"));
    }

    #[test]
    fn test_account_before_any_header_is_diagnosed() {
        let result = scan(
            "\
Warehouse,Account,Jan,Feb,Jan,Feb
,Orphan,1,1,1,1
Dallas,Freight,50,100,5,10
",
        );

        assert_eq!(result.table.entry_count(), 1);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::MalformedWarehouseBlock {
                row: 1,
                warehouse: None,
                account: "Orphan".to_string(),
            }]
        );
    }

    #[test]
    fn test_header_without_account_opens_bucket() {
        let result = scan(
            "\
Warehouse,Account,Jan,Feb,Jan,Feb
Austin,,,,,
,Freight,3,4,1,1
",
        );

        assert!(result.table.contains("Austin", "Freight"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_repeated_account_overwrites() {
        let result = scan(
            "\
Warehouse,Account,Jan,Feb,Jan,Feb
Dallas,Freight,1,1,1,1
,Freight,2,2,2,2
",
        );

        assert_eq!(
            result.table.record("Dallas", "Freight").unwrap().volume.values(),
            &[2.0, 2.0]
        );
    }

    #[test]
    fn test_custom_total_predicate() {
        let totals = TotalRowMatcher::from_fn(|name| name.starts_with("Sum"));
        assert!(totals.is_total("Sum of Dallas"));
        assert!(!totals.is_total("Total Logistics"));

        let default = TotalRowMatcher::default();
        assert!(default.is_total("Total Logistics"));
        assert!(default.is_total("subtotal"));
    }

    #[test]
    fn test_parse_error_in_warehouse_region() {
        let sheet = Sheet::from_csv_reader(
            "history",
            "Warehouse,Account\nDallas,Freight,x,1,1,1\n".as_bytes(),
        )
        .unwrap();
        let err = build_warehouse_table(&sheet, CellRef::new(1, 0), &ranges(), &TotalRowMatcher::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
    }
}
