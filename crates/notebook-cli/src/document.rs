use anyhow::{bail, Result};
use notebook_grid::{ColumnDef, DataGrid, Grid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A grid as stored on disk: column definitions plus rows of raw cell input.
///
/// Cells may be JSON strings (parsed like typed input, so `=...` is a
/// formula), numbers, booleans or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Value>>,
}

impl GridDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_data_grid(self) -> Result<DataGrid> {
        let inputs = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell_input).collect::<Result<Vec<String>>>())
            .collect::<Result<Vec<_>>>()?;
        let grid = Grid::from_inputs(inputs);

        Ok(if self.columns.is_empty() {
            DataGrid::from_grid(grid)
        } else {
            DataGrid::new(grid, self.columns)
        })
    }
}

fn cell_input(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => bail!("unsupported cell value: {}", other),
    })
}

/// Column index for a name given on the command line: a column key or
/// header (case-insensitive), else a column letter.
pub fn resolve_column(name: &str, grid: &DataGrid) -> Result<u32> {
    let by_name = grid.columns().iter().position(|c| {
        c.key.eq_ignore_ascii_case(name) || c.header.eq_ignore_ascii_case(name)
    });
    if let Some(index) = by_name {
        return Ok(index as u32);
    }

    match notebook_core::col_from_label(name) {
        Some(col) if col < grid.grid().col_count() => Ok(col),
        _ => bail!("no column named '{}'", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_grid::{CellCoord, CellValue};

    #[test]
    fn test_document_to_grid() {
        let doc = GridDocument::from_json(
            r#"{
                "columns": [
                    {"key": "item", "header": "Item"},
                    {"key": "qty", "header": "Qty", "type": "number"}
                ],
                "rows": [["apple", 3], ["pear", null], ["total", "=SUM(B1:B2)"]]
            }"#,
        )
        .unwrap();

        let grid = doc.into_data_grid().unwrap();
        let computed = grid.compute();
        assert_eq!(computed.get(CellCoord::new(2, 1)), Some(&CellValue::Number(3.0)));
        assert_eq!(resolve_column("qty", &grid).unwrap(), 1);
        assert_eq!(resolve_column("Item", &grid).unwrap(), 0);
        assert_eq!(resolve_column("b", &grid).unwrap(), 1);
        assert!(resolve_column("Z", &grid).is_err());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let doc = GridDocument::from_json(r#"{"rows": [[[1, 2]]]}"#).unwrap();
        assert!(doc.into_data_grid().is_err());
    }

    #[test]
    fn test_default_columns_are_lettered() {
        let doc = GridDocument::from_json(r#"{"rows": [[1, true]]}"#).unwrap();
        let grid = doc.into_data_grid().unwrap();
        assert_eq!(grid.columns()[1].header, "B");
        assert_eq!(
            grid.compute().get(CellCoord::new(0, 1)),
            Some(&CellValue::Boolean(true))
        );
    }
}
