use serde::{Deserialize, Serialize};

use crate::range::col_to_label;

/// Kind of data a column is expected to hold. Display hint only; the
/// formula engine never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
}

/// Column metadata consumed by the view projection and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
            column_type: ColumnType::Text,
            sortable: true,
            filterable: true,
        }
    }

    /// Spreadsheet-style column labelled by its letter (A, B, ...)
    pub fn lettered(col: u32) -> Self {
        let label = col_to_label(col);
        ColumnDef::new(label.clone(), label)
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let col: ColumnDef =
            serde_json::from_str(r#"{"key": "total", "header": "Total", "type": "number"}"#)
                .unwrap();
        assert_eq!(col.column_type, ColumnType::Number);
        assert!(col.sortable);
        assert!(col.filterable);
        assert_eq!(col.width, None);
    }

    #[test]
    fn test_lettered() {
        let col = ColumnDef::lettered(27);
        assert_eq!(col.key, "AB");
        assert_eq!(col.header, "AB");
    }
}
