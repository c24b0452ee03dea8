use std::path::PathBuf;

use clap::Parser;
use notebook_grid::{FreezeMode, SortDirection};

#[derive(Parser, Debug)]
#[command(name = "notebook-cli")]
#[command(about = "Compute a notebook grid document and print its view as CSV")]
#[command(version)]
pub struct Cli {
    /// Grid document (JSON with `columns` and `rows`)
    pub document: PathBuf,

    /// Sort by column (letter, key or header), optionally `:desc`
    #[arg(long, value_name = "COL[:desc]", value_parser = parse_sort)]
    pub sort: Option<SortArg>,

    /// Keep rows whose column contains TEXT (case-insensitive); repeatable
    #[arg(long = "filter", value_name = "COL=TEXT", value_parser = parse_filter)]
    pub filters: Vec<FilterArg>,

    /// Frozen rows: a count, `first`, or `selected`
    #[arg(long, value_name = "N|first|selected", value_parser = parse_freeze)]
    pub freeze: Option<FreezeMode>,

    /// Selected row (1-based), used by `--freeze selected`
    #[arg(long, value_name = "ROW")]
    pub select: Option<u32>,

    /// Omit the CSV header row
    #[arg(long)]
    pub no_header: bool,

    /// Grid configuration file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write the raw grid snapshot to PATH
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortArg {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub column: String,
    pub needle: String,
}

fn parse_sort(s: &str) -> Result<SortArg, String> {
    let (column, direction) = match s.rsplit_once(':') {
        Some((column, dir)) => {
            let direction = match dir.to_lowercase().as_str() {
                "asc" => SortDirection::Ascending,
                "desc" => SortDirection::Descending,
                other => return Err(format!("unknown sort direction '{}'", other)),
            };
            (column, direction)
        }
        None => (s, SortDirection::Ascending),
    };

    if column.trim().is_empty() {
        return Err("sort column is empty".to_string());
    }
    Ok(SortArg {
        column: column.trim().to_string(),
        direction,
    })
}

fn parse_filter(s: &str) -> Result<FilterArg, String> {
    let (column, needle) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COL=TEXT, got '{}'", s))?;

    if column.trim().is_empty() {
        return Err("filter column is empty".to_string());
    }
    Ok(FilterArg {
        column: column.trim().to_string(),
        needle: needle.to_string(),
    })
}

fn parse_freeze(s: &str) -> Result<FreezeMode, String> {
    match s.to_lowercase().as_str() {
        "none" | "0" => Ok(FreezeMode::None),
        "first" => Ok(FreezeMode::FirstRow),
        "selected" => Ok(FreezeMode::SelectedRow),
        other => other
            .parse::<u32>()
            .map(FreezeMode::Count)
            .map_err(|_| format!("expected a row count, 'first' or 'selected', got '{}'", s)),
    }
}
