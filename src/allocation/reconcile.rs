//! Removal of warehouse accounts that have no global counterpart

use super::engine::MissingEntry;
use crate::accounts::WarehouseTable;
use crate::diagnostics::Diagnostic;
use std::collections::HashSet;

/// Remove every missing (warehouse, account) pair from the table
///
/// Returns the number of entries actually removed; pairs already absent are
/// skipped, so applying this twice leaves the table as applying it once.
pub fn reconcile(table: &mut WarehouseTable, missing: &[MissingEntry]) -> usize {
    missing
        .iter()
        .filter(|entry| table.remove(&entry.warehouse, &entry.account).is_some())
        .count()
}

/// Remove pairs excluded because of a series length mismatch
pub fn exclude_mismatched(table: &mut WarehouseTable, mismatches: &[Diagnostic]) -> usize {
    mismatches
        .iter()
        .filter(|diagnostic| match diagnostic {
            Diagnostic::ShapeMismatch { warehouse, account, .. } => {
                table.remove(warehouse, account).is_some()
            }
            _ => false,
        })
        .count()
}

/// Distinct (warehouse, account) pairs in first-recorded order
pub fn distinct_pairs(missing: &[MissingEntry]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    missing
        .iter()
        .filter(|entry| seen.insert((entry.warehouse.as_str(), entry.account.as_str())))
        .map(|entry| (entry.warehouse.clone(), entry.account.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountRecord, AccountTable};
    use crate::allocation::{to_projection_table, to_share_table, AllocationMode, ShapeMismatchPolicy};

    fn record(volume: &[f64], margin: &[f64]) -> AccountRecord {
        AccountRecord::new(volume.to_vec().into(), margin.to_vec().into())
    }

    fn missing(warehouse: &str, account: &str, pass: AllocationMode) -> MissingEntry {
        MissingEntry {
            warehouse: warehouse.to_string(),
            account: account.to_string(),
            pass,
        }
    }

    fn sample_table() -> WarehouseTable {
        let mut table = WarehouseTable::new();
        table.insert("W1", "A", record(&[1.0], &[1.0]));
        table.insert("W2", "A", record(&[2.0], &[2.0]));
        table.insert("W2", "B", record(&[3.0], &[3.0]));
        table
    }

    #[test]
    fn test_removes_missing_pairs() {
        let mut table = sample_table();
        let entries = vec![missing("W2", "B", AllocationMode::ToShare)];

        assert_eq!(reconcile(&mut table, &entries), 1);
        assert!(!table.contains("W2", "B"));
        assert!(table.contains("W2", "A"));
        assert_eq!(table.entry_count(), 2);
    }

    #[test]
    fn test_idempotent() {
        let entries = vec![
            missing("W2", "B", AllocationMode::ToShare),
            missing("W2", "B", AllocationMode::ToProjection),
            missing("W9", "Z", AllocationMode::ToShare),
        ];

        let mut once = sample_table();
        reconcile(&mut once, &entries);

        let mut twice = once.clone();
        assert_eq!(reconcile(&mut twice, &entries), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_account_excluded_end_to_end() {
        let hist: AccountTable = [("A".to_string(), record(&[10.0, 10.0], &[1.0, 1.0]))]
            .into_iter()
            .collect();
        let proj: AccountTable = [("A".to_string(), record(&[30.0, 30.0], &[3.0, 3.0]))]
            .into_iter()
            .collect();
        let mut table = WarehouseTable::new();
        table.insert("W1", "A", record(&[5.0, 5.0], &[0.5, 0.5]));
        table.insert("W2", "B", record(&[1.0, 1.0], &[1.0, 1.0]));

        let shares = to_share_table(&table, &hist, ShapeMismatchPolicy::Abort).unwrap();
        let projection = to_projection_table(&shares.table, &proj, ShapeMismatchPolicy::Abort).unwrap();

        let mut all_missing = shares.missing.clone();
        all_missing.extend(projection.missing.iter().cloned());
        assert_eq!(
            all_missing,
            vec![
                missing("W2", "B", AllocationMode::ToShare),
                missing("W2", "B", AllocationMode::ToProjection),
            ]
        );

        let final_table = projection.table.reconciled(&all_missing, &[]);
        assert!(!final_table.contains("W2", "B"));
        assert_eq!(final_table.record("W1", "A").unwrap().volume.values(), &[15.0, 15.0]);
        assert_eq!(distinct_pairs(&all_missing), vec![("W2".to_string(), "B".to_string())]);
    }

    #[test]
    fn test_exclude_mismatched() {
        let mut table = sample_table();
        let mismatches = vec![Diagnostic::ShapeMismatch {
            warehouse: "W1".to_string(),
            account: "A".to_string(),
            metric: "volume",
            local_len: 1,
            global_len: 2,
        }];

        assert_eq!(exclude_mismatched(&mut table, &mismatches), 1);
        assert!(!table.contains("W1", "A"));
    }
}
