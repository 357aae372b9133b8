//! Account data: monthly series, global account tables and warehouse tables

mod series;
mod table;
mod warehouse;

pub use series::{extract, parse_cell, sanitize, MonthlySeries};
pub use table::{build_account_table, AccountRecord, AccountTable};
pub use warehouse::{build_warehouse_table, TotalRowMatcher, WarehouseScan, WarehouseTable};
