//! Covariate extraction runner.
//!
//! Reads a pipeline configuration (area of interest, asset ids, thresholds)
//! from JSON, runs the extraction against a file-backed asset catalogue, and
//! submits the two CSV export jobs. The tool waits for both jobs unless
//! --no-wait is given.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use trailenv_core::pipeline::{self, PipelineConfig};
use trailenv_core::table::ResultTable;
use trailenv_core::FileCatalog;

#[derive(Parser, Debug)]
#[command(
    name = "extract",
    about = "Extract environmental covariates per trail segment and export CSV tables"
)]
struct Args {
    /// Pipeline configuration JSON.
    #[arg(short, long)]
    config: PathBuf,

    /// Root directory of the asset catalogue.
    #[arg(short = 'a', long, default_value = "data/assets")]
    assets: PathBuf,

    /// Submit the export jobs and exit without waiting for them. Jobs still
    /// running when the process exits are abandoned.
    #[arg(long)]
    no_wait: bool,

    /// Rows of each table to print as a preview (0 disables).
    #[arg(long, default_value = "10")]
    preview: usize,
}

fn print_preview(label: &str, table: &ResultTable, rows: usize) {
    if rows == 0 {
        return;
    }
    println!("{label}: {} row(s), columns: {}", table.len(), table.columns.join(", "));
    for row in table.rows.iter().take(rows) {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::Null => "-".to_string(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        println!("  {}", cells.join(", "));
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.config)
        .with_context(|| format!("cannot open config {}", args.config.display()))?;
    let config: PipelineConfig =
        serde_json::from_reader(BufReader::new(file)).context("cannot parse pipeline config")?;

    let catalog = FileCatalog::new(&args.assets);
    let output = pipeline::run(&config, &catalog).context("pipeline failed")?;

    // Surfaced regardless of RUST_LOG; the operator must see these.
    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    print_preview("continuous", &output.continuous, args.preview);
    print_preview("categorical", &output.categorical, args.preview);

    let handles = pipeline::submit_exports(output, &config.export)
        .context("export submission failed")?;

    if args.no_wait {
        for handle in &handles {
            println!("export {:?} submitted", handle.description());
        }
    } else {
        for handle in handles {
            let report = handle.wait()?;
            println!(
                "export {:?} done: {} row(s) -> {}",
                report.description,
                report.rows,
                report.path.display()
            );
        }
    }
    Ok(())
}
