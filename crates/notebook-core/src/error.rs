use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Marker shown for a cell caught in a reference cycle
pub const CIRCULAR_SENTINEL: &str = "#CIRCULAR";
/// Marker shown for any other failed formula
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Represents possible cell errors (Excel-compatible)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellError {
    /// #DIV/0! - Division by zero
    DivisionByZero,
    /// #VALUE! - Invalid value type
    InvalidValue,
    /// #REF! - Invalid cell reference
    InvalidReference,
    /// #NAME? - Unrecognized function or name
    InvalidName,
    /// #NULL! - Null intersection
    NullError,
    /// #NUM! - Invalid numeric value
    NumError,
    /// #N/A - Value not available
    NotAvailable,
    /// Formula text could not be parsed
    Syntax,
    /// Circular reference detected
    CircularReference,
}

impl CellError {
    pub fn is_circular(&self) -> bool {
        matches!(self, CellError::CircularReference)
    }

    /// The coarse marker a grid shows in place of a value:
    /// `#CIRCULAR` for cycles, `#ERROR` for everything else.
    pub fn sentinel(&self) -> &'static str {
        if self.is_circular() {
            CIRCULAR_SENTINEL
        } else {
            ERROR_SENTINEL
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::DivisionByZero => write!(f, "#DIV/0!"),
            CellError::InvalidValue => write!(f, "#VALUE!"),
            CellError::InvalidReference => write!(f, "#REF!"),
            CellError::InvalidName => write!(f, "#NAME?"),
            CellError::NullError => write!(f, "#NULL!"),
            CellError::NumError => write!(f, "#NUM!"),
            CellError::NotAvailable => write!(f, "#N/A"),
            CellError::Syntax => write!(f, "{}", ERROR_SENTINEL),
            CellError::CircularReference => write!(f, "{}", CIRCULAR_SENTINEL),
        }
    }
}

/// Errors raised at the cell store boundary.
///
/// These are contract violations by the caller, unlike [`CellError`] which is
/// ordinary cell data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    #[error("cell ({row}, {col}) is read-only")]
    ReadOnly { row: u32, col: u32 },

    #[error("row index {index} is outside 0..={len}")]
    RowIndex { index: u32, len: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert_eq!(CellError::CircularReference.sentinel(), "#CIRCULAR");
        assert_eq!(CellError::DivisionByZero.sentinel(), "#ERROR");
        assert_eq!(CellError::DivisionByZero.to_string(), "#DIV/0!");
        assert_eq!(CellError::CircularReference.to_string(), "#CIRCULAR");
    }

    #[test]
    fn test_grid_error_message() {
        let err = GridError::OutOfRange {
            row: 5,
            col: 1,
            rows: 3,
            cols: 2,
        };
        assert_eq!(err.to_string(), "cell (5, 1) is outside the 3x2 grid");
    }
}
