use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};

use buoy_grid::config::Config;
use buoy_grid::data::filter::{DepthChoice, Selection};
use buoy_grid::data::loader::{self, Source};
use buoy_grid::data::projection::CellSize;
use buoy_grid::deck::DeckDocument;
use buoy_grid::pipeline;

/// Filter buoy readings and print the deck.gl grid-layer document as JSON.
#[derive(Parser)]
#[command(name = "buoy-layer", version)]
struct Cli {
    /// CSV URL or file (defaults to the configured source)
    #[arg(short, long)]
    source: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Date to show, YYYY-MM-DD (defaults to the earliest date)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Approximate depth: All, 0, 1, 4 or 7
    #[arg(long, default_value = "All")]
    depth: DepthChoice,

    /// Grid cell size, 100..=600 in steps of 5
    #[arg(long)]
    cell_size: Option<i64>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the selectable dates and depths, then exit
    #[arg(long)]
    list_options: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("loading config")?;
    let cell_size = match cli.cell_size {
        Some(v) => CellSize::new(v)?,
        None => config.cell_size(),
    };
    let source = Source::parse(cli.source.as_deref().unwrap_or(&config.source_url));
    let dataset = loader::load(&source).with_context(|| format!("loading {source}"))?;

    let selection = Selection {
        date: cli.date,
        depth: cli.depth,
    };
    let output = pipeline::run(&dataset, &selection, cell_size)?;

    if cli.list_options {
        match output.date_range {
            Some(r) => println!("dates: {} .. {}", r.min, r.max),
            None => println!("dates: (no Date column)"),
        }
        match &output.depth_options {
            Some(opts) => {
                let labels: Vec<String> = opts.iter().map(|o| o.to_string()).collect();
                println!("depths: {}", labels.join(", "));
            }
            None => println!("depths: (no Appr_depth column)"),
        }
        return Ok(());
    }

    if output.rows.is_empty() {
        warn!("No readings match the selection");
    }

    let json = DeckDocument::new(&config, &output).to_json_pretty()?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(
                "Wrote {} readings to {} ({})",
                output.row_count(),
                path.display(),
                output.tooltip
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
