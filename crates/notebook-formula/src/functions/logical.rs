use notebook_core::{CellError, CellValue};

/// Truthiness of a value for IF/AND/OR. Blanks are skipped (`None`).
fn truth(value: &CellValue) -> Result<Option<bool>, CellValue> {
    match value {
        CellValue::Boolean(b) => Ok(Some(*b)),
        CellValue::Number(n) => Ok(Some(*n != 0.0)),
        CellValue::Empty => Ok(None),
        CellValue::Error(e) => Err(CellValue::Error(e.clone())),
        CellValue::Text(_) => Err(CellValue::Error(CellError::InvalidValue)),
    }
}

/// Condition value of IF; a blank condition is false
pub fn condition(value: &CellValue) -> Result<bool, CellValue> {
    truth(value).map(|b| b.unwrap_or(false))
}

/// AND - Logical AND of all values
pub fn and(values: &[CellValue]) -> CellValue {
    if values.is_empty() {
        return CellValue::Error(CellError::InvalidValue);
    }

    let mut result = true;
    for value in values {
        match truth(value) {
            Ok(Some(b)) => result &= b,
            Ok(None) => {}
            Err(e) => return e,
        }
    }

    CellValue::Boolean(result)
}

/// OR - Logical OR of all values
pub fn or(values: &[CellValue]) -> CellValue {
    if values.is_empty() {
        return CellValue::Error(CellError::InvalidValue);
    }

    let mut result = false;
    for value in values {
        match truth(value) {
            Ok(Some(b)) => result |= b,
            Ok(None) => {}
            Err(e) => return e,
        }
    }

    CellValue::Boolean(result)
}

/// NOT - Logical NOT
pub fn not(values: &[CellValue]) -> CellValue {
    match values.first().map(truth) {
        Some(Ok(b)) => CellValue::Boolean(!b.unwrap_or(false)),
        Some(Err(e)) => e,
        None => CellValue::Error(CellError::InvalidValue),
    }
}

/// ISERROR - TRUE when the value is any error
pub fn is_error(values: &[CellValue]) -> CellValue {
    CellValue::Boolean(values.first().is_some_and(CellValue::is_error))
}

/// ISBLANK - TRUE when the value is empty
pub fn is_blank(values: &[CellValue]) -> CellValue {
    CellValue::Boolean(values.first().is_some_and(CellValue::is_empty))
}
