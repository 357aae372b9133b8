//! Output tables: projected warehouse accounts, missing accounts, debug dumps

use crate::accounts::{AccountRecord, AccountTable, WarehouseTable};
use crate::error::Result;
use crate::pipeline::{AnalysisResult, RunSummary};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const DEFAULT_PROJECTION_OUTPUT: &str = "PROJECTED_ACCOUNTS.csv";
pub const DEFAULT_MISSING_OUTPUT: &str = "MISSING_ACCOUNTS.csv";

const WAREHOUSE_HEADER: &str = "Warehouse";
const ACCOUNT_HEADER: &str = "Acct#Name";

fn series_fields(record: &AccountRecord) -> impl Iterator<Item = String> + '_ {
    record
        .volume
        .values()
        .iter()
        .chain(record.margin.values())
        .map(f64::to_string)
}

/// Write the projection table
///
/// Two header rows: group captions over the volume and margin blocks, then
/// warehouse/account captions followed by the month labels.
pub fn write_projection<W: Write>(writer: W, result: &AnalysisResult) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    let volumes = result.volume_labels.len();
    let margins = result.margin_labels.len();

    let mut groups = vec![String::new(); 2 + volumes + margins];
    if volumes > 0 {
        groups[2] = "Volumes".to_string();
    }
    if margins > 0 {
        groups[2 + volumes] = "Gross Margins".to_string();
    }
    csv.write_record(&groups)?;

    let captions = [WAREHOUSE_HEADER, ACCOUNT_HEADER]
        .into_iter()
        .chain(result.volume_labels.iter().map(String::as_str))
        .chain(result.margin_labels.iter().map(String::as_str));
    csv.write_record(captions)?;

    for (warehouse, account, record) in result.projection.entries() {
        let row = [warehouse.clone(), account.clone()]
            .into_iter()
            .chain(series_fields(record));
        csv.write_record(row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the missing-accounts table, one row per distinct pair
pub fn write_missing<W: Write>(writer: W, pairs: &[(String, String)]) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record([WAREHOUSE_HEADER, ACCOUNT_HEADER])?;
    for (warehouse, account) in pairs {
        csv.write_record([warehouse, account])?;
    }
    csv.flush()?;
    Ok(())
}

/// Render the projection and missing-accounts tables in memory
pub fn render_outputs(result: &AnalysisResult) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut projection = Vec::new();
    write_projection(&mut projection, result)?;

    let mut missing = Vec::new();
    write_missing(&mut missing, &result.missing_pairs())?;
    Ok((projection, missing))
}

/// Write both output tables to files
///
/// Both tables are rendered before either file is created, so a table that
/// cannot be rendered leaves no partial output behind.
pub fn write_outputs(projection_path: &Path, missing_path: &Path, result: &AnalysisResult) -> Result<()> {
    let (projection, missing) = render_outputs(result)?;

    File::create(projection_path)?.write_all(&projection)?;
    log::info!("Projection written to {}", projection_path.display());

    File::create(missing_path)?.write_all(&missing)?;
    log::info!("Missing accounts written to {}", missing_path.display());
    Ok(())
}

fn tsv<W: Write>(writer: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(writer)
}

/// Tab-separated dump of a global account table: name, volumes, margins
pub fn write_account_dump<W: Write>(writer: W, table: &AccountTable) -> Result<()> {
    let mut out = tsv(writer);
    for (account, record) in table.iter() {
        out.write_record(std::iter::once(account.clone()).chain(series_fields(record)))?;
    }
    out.flush()?;
    Ok(())
}

/// Tab-separated dump of a warehouse table: one line per warehouse, then its accounts
pub fn write_warehouse_dump<W: Write>(writer: W, table: &WarehouseTable) -> Result<()> {
    let mut out = tsv(writer);
    for (warehouse, accounts) in table.iter() {
        out.write_record([format!("{} :", warehouse)])?;
        for (account, record) in accounts.iter() {
            let row = [String::new(), account.clone()]
                .into_iter()
                .chain(series_fields(record));
            out.write_record(row)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write the three debug dumps into `dir`
pub fn write_dumps(dir: &Path, result: &AnalysisResult) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_account_dump(File::create(dir.join("histAccounts.txt"))?, &result.historical_accounts)?;
    write_account_dump(File::create(dir.join("projAccounts.txt"))?, &result.projected_accounts)?;
    write_warehouse_dump(File::create(dir.join("warehouses.txt"))?, &result.projection)?;
    log::info!("Debug dumps written to {}", dir.display());
    Ok(())
}

/// Write the run summary as pretty JSON
pub fn write_summary<W: Write>(writer: W, summary: &RunSummary) -> Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
