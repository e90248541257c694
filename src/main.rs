//! # rusty-plankton
//!
//! Aggregates a directory of per-sample plankton exports into one geolocated
//! concentration dataset for the world map view.
//!
//! ## Usage
//!
//! ```bash
//! # Print the dataset as CSV
//! rusty-plankton --root ../data/export/
//!
//! # Write Parquet and replay a click on the third point
//! rusty-plankton --format parquet --output samples.parquet --select 2
//! ```

mod color;
mod config;
mod data;
mod notify;
mod state;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use config::Config;
use data::assemble::initialize;
use data::export::{write_dataset, ExportFormat};
use notify::{LogSink, SelectionEvent};
use state::ViewState;

/// Build the sample concentration dataset behind the world map.
#[derive(Parser)]
#[command(name = "rusty-plankton")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the per-sample exports (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Topic selections are published on (overrides the config file)
    #[arg(short, long)]
    topic: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Replay a click on the point at this index (repeatable)
    #[arg(short, long, value_name = "INDEX")]
    select: Vec<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_overrides(cli.root.clone(), cli.topic.clone());

    let dataset = initialize(&config)
        .with_context(|| format!("building dataset from {}", config.data.root.display()))?;
    if dataset.is_empty() {
        log::warn!("No samples found under {}", config.data.root.display());
    }
    info!("Dataset ready: {} records", dataset.len());

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_dataset(&dataset, cli.format, BufWriter::new(file))?;
            info!("Wrote {}", path.display());
        }
        None => write_dataset(&dataset, cli.format, std::io::stdout())?,
    }

    if cli.select.is_empty() {
        return Ok(());
    }

    let mut view = ViewState::new(dataset, config.publish.topic);
    let mut sink = LogSink;
    for &index in &cli.select {
        let Some(filename) = view.dataset.get(index).map(|r| r.filename.clone()) else {
            bail!(
                "--select {index} is out of range, dataset has {} records",
                view.dataset.len()
            );
        };
        view.handle_click(Some(SelectionEvent { point_index: index }), &mut sink);
        eprintln!("{} -> {filename}", view.topic);
    }

    Ok(())
}
