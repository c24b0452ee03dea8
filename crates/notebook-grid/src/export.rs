use notebook_core::{col_to_label, ColumnDef};
use thiserror::Error;
use tracing::debug;

use crate::config::ErrorDisplay;
use crate::view::ProjectedRow;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exported data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize projected rows as CSV.
///
/// Values are the computed ones, rendered through `display`; formulas never
/// appear. Fields with commas, quotes or line breaks are quoted with inner
/// quotes doubled. With `headers`, the first record holds the column headers,
/// padded with column letters when the data is wider than the definitions.
pub fn export_csv(
    rows: &[ProjectedRow],
    headers: Option<&[ColumnDef]>,
    display: ErrorDisplay,
) -> Result<String, ExportError> {
    let width = rows.iter().map(|r| r.values.len()).max().unwrap_or(0);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if let Some(columns) = headers {
        let width = width.max(columns.len());
        let record: Vec<String> = (0..width)
            .map(|col| match columns.get(col) {
                Some(def) => def.header.clone(),
                None => col_to_label(col as u32),
            })
            .collect();
        writer.write_record(&record)?;
    }

    for row in rows {
        let mut record: Vec<String> = row.values.iter().map(|v| display.render(v)).collect();
        if let Some(columns) = headers {
            record.resize(width.max(columns.len()), String::new());
        } else {
            record.resize(width, String::new());
        }
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    debug!(rows = rows.len(), bytes = bytes.len(), "exported CSV");
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_core::{CellError, CellValue};

    fn row(source_row: u32, values: Vec<CellValue>) -> ProjectedRow {
        ProjectedRow { source_row, values }
    }

    #[test]
    fn test_quoting() {
        let rows = vec![row(
            0,
            vec![
                CellValue::from("Smith, John \"Jr.\""),
                CellValue::from("line\nbreak"),
                CellValue::Number(3.0),
            ],
        )];

        let csv = export_csv(&rows, None, ErrorDisplay::Sentinel).unwrap();
        assert_eq!(csv, "\"Smith, John \"\"Jr.\"\"\",\"line\nbreak\",3\n");
    }

    #[test]
    fn test_headers_and_errors() {
        let rows = vec![
            row(0, vec![CellValue::from("a"), CellValue::Error(CellError::DivisionByZero)]),
            row(1, vec![CellValue::Empty, CellValue::Error(CellError::CircularReference)]),
        ];
        let columns = vec![ColumnDef::new("name", "Name")];

        let csv = export_csv(&rows, Some(&columns), ErrorDisplay::Sentinel).unwrap();
        assert_eq!(csv, "Name,B\na,#ERROR\n,#CIRCULAR\n");

        let csv = export_csv(&rows, None, ErrorDisplay::Detailed).unwrap();
        assert_eq!(csv, "a,#DIV/0!\n,#CIRCULAR\n");
    }

    #[test]
    fn test_empty() {
        assert_eq!(export_csv(&[], None, ErrorDisplay::Sentinel).unwrap(), "");
    }
}
