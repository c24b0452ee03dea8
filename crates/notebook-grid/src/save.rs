use notebook_core::{Cell, ColumnDef, Grid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize grid: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save rejected: {0}")]
    Rejected(String),
}

/// The raw grid handed to a save handler: literal values, formulas and
/// read-only flags exactly as stored, plus the column definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Cell>>,
}

impl GridSnapshot {
    pub fn new(grid: &Grid, columns: &[ColumnDef]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: grid.rows().to_vec(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the cell store this snapshot was taken from
    pub fn into_grid(self) -> (Grid, Vec<ColumnDef>) {
        (Grid::from_rows(self.rows), self.columns)
    }
}

/// Receives the raw grid on an explicit save. The engine persists nothing
/// itself.
pub trait SaveHandler {
    fn save(&mut self, snapshot: &GridSnapshot) -> Result<(), SaveError>;
}

impl<F> SaveHandler for F
where
    F: FnMut(&GridSnapshot) -> Result<(), SaveError>,
{
    fn save(&mut self, snapshot: &GridSnapshot) -> Result<(), SaveError> {
        self(snapshot)
    }
}

/// Save handler writing pretty JSON to any writer
pub struct JsonSaveHandler<W> {
    writer: W,
}

impl<W: std::io::Write> JsonSaveHandler<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> SaveHandler for JsonSaveHandler<W> {
    fn save(&mut self, snapshot: &GridSnapshot) -> Result<(), SaveError> {
        serde_json::to_writer_pretty(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
