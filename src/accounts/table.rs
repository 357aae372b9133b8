//! Global (unpartitioned) account tables

use super::series::{extract, MonthlySeries};
use crate::config::AccountRanges;
use crate::error::Result;
use crate::sheet::TabularSource;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Volume and gross margin series for one account
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountRecord {
    pub volume: MonthlySeries,
    pub margin: MonthlySeries,
}

impl AccountRecord {
    pub fn new(volume: MonthlySeries, margin: MonthlySeries) -> Self {
        Self { volume, margin }
    }

    /// Read both series for `row` from the configured columns
    pub fn extract<S: TabularSource + ?Sized>(
        source: &S,
        ranges: &AccountRanges,
        row: usize,
    ) -> Result<Self> {
        Ok(Self {
            volume: extract(source, ranges.volumes.start_col(), ranges.volumes.end_col(), row)?,
            margin: extract(source, ranges.margins.start_col(), ranges.margins.end_col(), row)?,
        })
    }

    /// Sum another record into this one
    pub fn accumulate(&mut self, other: &AccountRecord) {
        self.volume.accumulate(&other.volume);
        self.margin.accumulate(&other.margin);
    }
}

/// Account name -> record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountTable {
    accounts: BTreeMap<String, AccountRecord>,
}

impl AccountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &str) -> Option<&AccountRecord> {
        self.accounts.get(account)
    }

    pub fn contains(&self, account: &str) -> bool {
        self.accounts.contains_key(account)
    }

    /// Insert or overwrite an account
    pub fn insert<S: Into<String>>(&mut self, account: S, record: AccountRecord) -> Option<AccountRecord> {
        self.accounts.insert(account.into(), record)
    }

    /// Remove an account; absent accounts are ignored
    pub fn remove(&mut self, account: &str) -> Option<AccountRecord> {
        self.accounts.remove(account)
    }

    /// Add a record to an existing account, or insert it as new
    pub fn accumulate<S: Into<String>>(&mut self, account: S, record: AccountRecord) {
        match self.accounts.entry(account.into()) {
            btree_map::Entry::Occupied(mut entry) => entry.get_mut().accumulate(&record),
            btree_map::Entry::Vacant(entry) => {
                log::debug!("New account: {}", entry.key());
                entry.insert(record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AccountRecord)> {
        self.accounts.iter()
    }
}

impl FromIterator<(String, AccountRecord)> for AccountTable {
    fn from_iter<I: IntoIterator<Item = (String, AccountRecord)>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}

/// Build a global account table by scanning the account name column
///
/// Rows with an empty name are skipped. A name seen more than once has its
/// series summed month by month.
pub fn build_account_table<S: TabularSource + ?Sized>(
    source: &S,
    ranges: &AccountRanges,
) -> Result<AccountTable> {
    let name_col = ranges.names.start_col();
    let mut table = AccountTable::new();
    let mut rows_read = 0usize;

    for row in ranges.names.rows() {
        let name = source.cell_text(row, name_col).trim();
        if name.is_empty() {
            continue;
        }

        let record = AccountRecord::extract(source, ranges, row)?;
        table.accumulate(name, record);
        rows_read += 1;
    }

    log::info!(
        "Sheet '{}': {} account rows aggregated into {} accounts",
        source.name(),
        rows_read,
        table.len()
    );

    Ok(table)
}
