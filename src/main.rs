mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;

use app::BuoyGridApp;
use buoy_grid::config::Config;
use buoy_grid::data::loader::Source;

/// Desktop viewer for daily-average buoy readings.
#[derive(Parser)]
#[command(name = "buoy-grid", version)]
struct Args {
    /// TOML config file (defaults to ./buoy-grid.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV URL or file to open instead of the configured source
    #[arg(short, long)]
    source: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("loading config")?;
    let source = Source::parse(args.source.as_deref().unwrap_or(&config.source_url));
    let title = config.title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(BuoyGridApp::new(config, source)))),
    )
    .map_err(|e| anyhow!("running the viewer: {e}"))
}
