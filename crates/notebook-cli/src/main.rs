mod cli;
mod config;
mod document;

use std::fs::{self, File};
use std::io::BufWriter;

use anyhow::{Context, Result};
use clap::Parser;
use notebook_grid::{GridConfig, JsonSaveHandler, SortSpec};
use notebook_status::StatusBus;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::document::{resolve_column, GridDocument};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let csv = run(cli, &config)?;
    print!("{}", csv);
    Ok(())
}

fn run(cli: Cli, config: &Config) -> Result<String> {
    let mut grid_config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            GridConfig::from_json(&json)?
        }
        None => GridConfig::default(),
    };
    if let Some(mode) = config.error_display {
        grid_config.error_display = mode;
    }
    if let Some(freeze) = cli.freeze {
        grid_config.freeze = freeze;
    }
    if cli.no_header {
        grid_config.export_headers = false;
    }

    let json = fs::read_to_string(&cli.document)
        .with_context(|| format!("failed to read document {}", cli.document.display()))?;
    let document = GridDocument::from_json(&json)
        .with_context(|| format!("invalid grid document {}", cli.document.display()))?;

    let status = StatusBus::new();
    let _status_log = status.subscribe(|message| match message.level {
        notebook_status::StatusLevel::Error => warn!("{}", message.text),
        _ => info!("{}", message.text),
    });

    let mut grid = document
        .into_data_grid()?
        .with_config(grid_config)
        .with_status(status);
    debug!(
        rows = grid.grid().row_count(),
        cols = grid.grid().col_count(),
        "document loaded"
    );

    if let Some(row) = cli.select {
        grid.select_row(row.checked_sub(1));
    }
    if let Some(sort) = &cli.sort {
        let column = resolve_column(&sort.column, &grid)?;
        grid.set_sort(Some(SortSpec {
            column,
            direction: sort.direction,
        }));
    }
    for filter in &cli.filters {
        let column = resolve_column(&filter.column, &grid)?;
        grid.set_filter(column, filter.needle.as_str());
    }

    if let Some(path) = &cli.save {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut handler = JsonSaveHandler::new(BufWriter::new(file));
        grid.save(&mut handler)
            .with_context(|| format!("failed to save snapshot to {}", path.display()))?;
    }

    Ok(grid.export_csv()?)
}
