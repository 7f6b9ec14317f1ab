//! CoverageJSON writer service.
//!
//! Reads gridded variables from a NetCDF file and writes them as a
//! CoverageJSON document, optionally splitting the ranges into tiles.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use covjson::{CoverageWriter, FileSink};
use netcdf_source::NetCdfSource;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Overrides, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "covjson-writer")]
#[command(about = "Write NetCDF variables as CoverageJSON")]
struct Args {
    /// NetCDF file to read
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the main CoverageJSON document
    #[arg(short, long)]
    output: Option<String>,

    /// Variable to write (repeatable)
    #[arg(short = 'v', long = "variable")]
    variables: Vec<String>,

    /// Split ranges into tile documents
    #[arg(long)]
    tiled: bool,

    /// Tile shape over the non-time axes, e.g. "64,64"
    #[arg(long)]
    tile_shape: Option<String>,

    /// Base URL tile documents are served from
    #[arg(long)]
    base_url: Option<String>,

    /// Attach a JSON-LD context to the main document
    #[arg(long)]
    linked_data: bool,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            output: self.output.clone(),
            variables: self.variables.clone(),
            tiled: self.tiled,
            tile_shape: self.tile_shape.clone(),
            base_url: self.base_url.clone(),
            linked_data: self.linked_data,
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json);

    run(&args).inspect_err(|e| error!(error = %format!("{:#}", e), "Write failed"))
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    let mut run_config = match &args.config {
        Some(path) => RunConfig::from_yaml(path)?,
        None => RunConfig::default(),
    };
    run_config.apply_env()?;
    run_config.apply_overrides(&args.overrides())?;
    let writer_config = run_config.into_writer_config()?;

    info!(
        input = %args.input.display(),
        output = %writer_config.output,
        variables = ?writer_config.variables,
        tiled = writer_config.is_tiled(),
        "Starting CoverageJSON write"
    );

    let source = NetCdfSource::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let mut sink = FileSink::current_dir();
    let summary = CoverageWriter::new(writer_config, &source)
        .write(&mut sink)
        .context("Failed to write coverage")?;

    info!(
        main = ?summary.main_document(),
        documents = summary.documents.len(),
        tiles = summary.tiles,
        bytes = summary.bytes,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "CoverageJSON write complete"
    );

    Ok(())
}
