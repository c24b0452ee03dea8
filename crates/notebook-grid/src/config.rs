use std::str::FromStr;

use notebook_core::CellValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view::FreezeMode;

#[derive(Debug, Error)]
pub enum GridConfigError {
    #[error("invalid grid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown error display mode '{0}' (expected 'sentinel' or 'detailed')")]
    UnknownErrorDisplay(String),
}

/// How error cells are rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDisplay {
    /// `#CIRCULAR` for cycles, `#ERROR` for everything else
    #[default]
    Sentinel,
    /// The specific marker (`#DIV/0!`, `#NAME?`, ...)
    Detailed,
}

impl ErrorDisplay {
    /// Display text of a computed value
    pub fn render(self, value: &CellValue) -> String {
        match (self, value) {
            (ErrorDisplay::Sentinel, CellValue::Error(e)) => e.sentinel().to_string(),
            _ => value.as_text(),
        }
    }
}

impl FromStr for ErrorDisplay {
    type Err = GridConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentinel" => Ok(ErrorDisplay::Sentinel),
            "detailed" => Ok(ErrorDisplay::Detailed),
            other => Err(GridConfigError::UnknownErrorDisplay(other.to_string())),
        }
    }
}

/// Grid behaviour settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub freeze: FreezeMode,
    pub error_display: ErrorDisplay,
    /// Write a header row from the column definitions when exporting
    pub export_headers: bool,
    /// Reject every edit, not only those to read-only cells
    pub read_only: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            freeze: FreezeMode::None,
            error_display: ErrorDisplay::Sentinel,
            export_headers: true,
            read_only: false,
        }
    }
}

impl GridConfig {
    pub fn from_json(json: &str) -> Result<Self, GridConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_core::CellError;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = GridConfig::from_json("{}").unwrap();
        assert_eq!(config, GridConfig::default());
        assert!(config.export_headers);
    }

    #[test]
    fn test_from_json() {
        let config = GridConfig::from_json(
            r#"{"freeze": {"count": 2}, "errorDisplay": "detailed", "readOnly": true}"#,
        )
        .unwrap();

        assert_eq!(config.freeze, FreezeMode::Count(2));
        assert_eq!(config.error_display, ErrorDisplay::Detailed);
        assert!(config.read_only);

        let config = GridConfig::from_json(r#"{"freeze": "firstRow"}"#).unwrap();
        assert_eq!(config.freeze, FreezeMode::FirstRow);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            GridConfig::from_json(r#"{"errorDisplay": "loud"}"#),
            Err(GridConfigError::Json(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let div = CellValue::Error(CellError::DivisionByZero);
        let circular = CellValue::Error(CellError::CircularReference);

        assert_eq!(ErrorDisplay::Sentinel.render(&div), "#ERROR");
        assert_eq!(ErrorDisplay::Sentinel.render(&circular), "#CIRCULAR");
        assert_eq!(ErrorDisplay::Detailed.render(&div), "#DIV/0!");
        assert_eq!(ErrorDisplay::Detailed.render(&CellValue::Number(2.5)), "2.5");

        assert_eq!("Detailed".parse::<ErrorDisplay>().unwrap(), ErrorDisplay::Detailed);
        assert!("loud".parse::<ErrorDisplay>().is_err());
    }
}
