//! Warehouse Budget CLI
//!
//! Reads the historical and projection sheets named in the configuration,
//! allocates the projected totals to warehouses and writes the projection and
//! missing-accounts tables.

use anyhow::{bail, Context};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use warehouse_budget::config::DEFAULT_CONFIG_PATH;
use warehouse_budget::report::{
    write_dumps, write_outputs, write_summary, DEFAULT_MISSING_OUTPUT, DEFAULT_PROJECTION_OUTPUT,
};
use warehouse_budget::{AnalysisRunner, ShapeMismatchPolicy, Sheet};

#[derive(Debug, Parser)]
#[command(name = "warehouse-budget", version, about = "Allocate projected account totals to warehouses")]
struct Args {
    /// Range configuration file (KEY=VALUE lines)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory holding the sheets named in the configuration
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Historical sheet, CSV or workbook (overrides HIST_DATA_FILE_NAME)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Projection sheet, CSV or workbook (overrides PROJ_DATA_FILE_NAME)
    #[arg(long)]
    projection: Option<PathBuf>,

    /// Projected warehouse accounts output
    #[arg(short, long, default_value = DEFAULT_PROJECTION_OUTPUT)]
    output: PathBuf,

    /// Missing accounts output
    #[arg(short, long, default_value = DEFAULT_MISSING_OUTPUT)]
    missing: PathBuf,

    /// Write tab-separated dumps of the intermediate tables here
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Drop accounts whose series lengths differ instead of aborting
    #[arg(long)]
    exclude_mismatched: bool,
}

fn sheet_path(explicit: Option<PathBuf>, configured: Option<&str>, data_dir: &Path, key: &str) -> anyhow::Result<PathBuf> {
    match (explicit, configured) {
        (Some(path), _) => Ok(path),
        (None, Some(name)) => Ok(data_dir.join(name)),
        (None, None) => bail!("no sheet given: pass a path or set {} in the configuration", key),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let mut runner = AnalysisRunner::from_config_file(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    if args.exclude_mismatched {
        runner.context_mut().shape_policy = ShapeMismatchPolicy::Exclude;
    }

    let config = &runner.context().config;
    let history_path = sheet_path(
        args.history,
        config.history_file.as_deref(),
        &args.data_dir,
        warehouse_budget::config::HIST_DATA_FILE_NAME,
    )?;
    let projection_path = sheet_path(
        args.projection,
        config.projection_file.as_deref(),
        &args.data_dir,
        warehouse_budget::config::PROJ_DATA_FILE_NAME,
    )?;

    let history = Sheet::open(&history_path)
        .with_context(|| format!("Failed to read {}", history_path.display()))?;
    let projection = Sheet::open(&projection_path)
        .with_context(|| format!("Failed to read {}", projection_path.display()))?;

    let result = runner.run(&history, &projection).context("Analysis failed")?;

    write_outputs(&args.output, &args.missing, &result).context("Failed to write output tables")?;

    if let Some(dir) = &args.dump_dir {
        write_dumps(dir, &result).context("Failed to write debug dumps")?;
    }

    for diagnostic in &result.diagnostics {
        log::warn!("{}", diagnostic);
    }

    let elapsed = start.elapsed().as_secs_f64();
    if let Some(path) = &args.summary {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_summary(file, &result.summary(elapsed))?;
    }

    println!(
        "Projected {} warehouse accounts ({} missing) -> {}",
        result.projection.entry_count(),
        result.missing_pairs().len(),
        args.output.display()
    );
    println!("This report took {:.3} sec to generate", elapsed);

    Ok(())
}
