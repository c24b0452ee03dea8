//! Built-in worksheet functions.
//!
//! Each function takes already-evaluated argument values. Ranges arrive
//! flattened row-major unless the function needs their shape (lookups).

pub mod logical;
pub mod lookup;
pub mod math;
pub mod text;

use notebook_core::{CellError, CellValue};

/// The first error among `values`, if any
pub(crate) fn propagate_error(values: &[CellValue]) -> Option<CellValue> {
    values.iter().find(|v| v.is_error()).cloned()
}

/// Numeric argument at `index`; blanks count as zero. The `Err` side is the
/// cell value the function should return.
pub(crate) fn arg_number(values: &[CellValue], index: usize) -> Result<f64, CellValue> {
    match values.get(index) {
        None => Err(CellValue::Error(CellError::InvalidValue)),
        Some(CellValue::Error(e)) => Err(CellValue::Error(e.clone())),
        Some(value) => value
            .coerce_number()
            .ok_or(CellValue::Error(CellError::InvalidValue)),
    }
}

/// Text argument at `index`
pub(crate) fn arg_text(values: &[CellValue], index: usize) -> Result<String, CellValue> {
    match values.get(index) {
        None => Err(CellValue::Error(CellError::InvalidValue)),
        Some(CellValue::Error(e)) => Err(CellValue::Error(e.clone())),
        Some(value) => Ok(value.as_text()),
    }
}
