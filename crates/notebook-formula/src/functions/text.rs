use notebook_core::{CellError, CellValue};

use super::{arg_number, arg_text, propagate_error};

/// CONCAT / CONCATENATE - Concatenate strings
pub fn concat(values: &[CellValue]) -> CellValue {
    if let Some(err) = propagate_error(values) {
        return err;
    }
    CellValue::Text(values.iter().map(CellValue::as_text).collect())
}

fn map_text(values: &[CellValue], f: impl Fn(&str) -> CellValue) -> CellValue {
    match arg_text(values, 0) {
        Ok(text) => f(&text),
        Err(e) => e,
    }
}

/// LEN - Length of text in characters
pub fn len(values: &[CellValue]) -> CellValue {
    map_text(values, |s| CellValue::Number(s.chars().count() as f64))
}

/// UPPER - Convert to uppercase
pub fn upper(values: &[CellValue]) -> CellValue {
    map_text(values, |s| CellValue::Text(s.to_uppercase()))
}

/// LOWER - Convert to lowercase
pub fn lower(values: &[CellValue]) -> CellValue {
    map_text(values, |s| CellValue::Text(s.to_lowercase()))
}

/// TRIM - Remove surrounding whitespace and collapse inner runs
pub fn trim(values: &[CellValue]) -> CellValue {
    map_text(values, |s| {
        CellValue::Text(s.split_whitespace().collect::<Vec<_>>().join(" "))
    })
}

/// Character count argument at `index`, defaulting to 1 when absent
fn char_count(values: &[CellValue], index: usize) -> Result<usize, CellValue> {
    if values.len() <= index {
        return Ok(1);
    }
    match arg_number(values, index)? {
        n if n >= 0.0 => Ok(n as usize),
        _ => Err(CellValue::Error(CellError::InvalidValue)),
    }
}

/// LEFT - Extract leftmost characters
pub fn left(values: &[CellValue]) -> CellValue {
    let (text, n) = match (arg_text(values, 0), char_count(values, 1)) {
        (Ok(t), Ok(n)) => (t, n),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    CellValue::Text(text.chars().take(n).collect())
}

/// RIGHT - Extract rightmost characters
pub fn right(values: &[CellValue]) -> CellValue {
    let (text, n) = match (arg_text(values, 0), char_count(values, 1)) {
        (Ok(t), Ok(n)) => (t, n),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let skip = text.chars().count().saturating_sub(n);
    CellValue::Text(text.chars().skip(skip).collect())
}

/// MID - Extract `length` characters starting at 1-based `start`
pub fn mid(values: &[CellValue]) -> CellValue {
    if values.len() < 3 {
        return CellValue::Error(CellError::InvalidValue);
    }
    let text = match arg_text(values, 0) {
        Ok(t) => t,
        Err(e) => return e,
    };
    let (start, length) = match (arg_number(values, 1), arg_number(values, 2)) {
        (Ok(s), Ok(l)) if s >= 1.0 && l >= 0.0 => (s as usize - 1, l as usize),
        (Err(e), _) | (_, Err(e)) => return e,
        _ => return CellValue::Error(CellError::InvalidValue),
    };

    CellValue::Text(text.chars().skip(start).take(length).collect())
}
