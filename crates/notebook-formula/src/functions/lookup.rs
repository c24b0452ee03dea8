use std::cmp::Ordering;

use notebook_core::{CellError, CellValue};

/// MATCH - 1-based position of `lookup_value` in a one-dimensional array.
///
/// `match_type` 0 is exact, 1 finds the largest value <= target (ascending
/// data), -1 the smallest value >= target (descending data).
pub fn match_fn(lookup_value: &CellValue, lookup_array: &[CellValue], match_type: i32) -> CellValue {
    if let CellValue::Error(e) = lookup_value {
        return CellValue::Error(e.clone());
    }

    let found = match match_type {
        0 => lookup_array
            .iter()
            .position(|v| compare(v, lookup_value) == Some(Ordering::Equal)),
        1 => last_position(lookup_array, |o| o != Ordering::Greater, lookup_value),
        -1 => last_position(lookup_array, |o| o != Ordering::Less, lookup_value),
        _ => return CellValue::Error(CellError::InvalidValue),
    };

    match found {
        Some(i) => CellValue::Number((i + 1) as f64),
        None => CellValue::Error(CellError::NotAvailable),
    }
}

fn last_position(
    array: &[CellValue],
    accept: impl Fn(Ordering) -> bool,
    target: &CellValue,
) -> Option<usize> {
    array
        .iter()
        .enumerate()
        .filter(|(_, v)| compare(v, target).is_some_and(&accept))
        .map(|(i, _)| i)
        .last()
}

/// VLOOKUP - search the first column of `table`, return column `col_index` (1-based)
pub fn vlookup(
    lookup_value: &CellValue,
    table: &[Vec<CellValue>],
    col_index: usize,
    approximate: bool,
) -> CellValue {
    let keys: Vec<CellValue> = table
        .iter()
        .map(|row| row.first().cloned().unwrap_or_default())
        .collect();
    let width = table.first().map_or(0, Vec::len);
    if col_index == 0 || col_index > width {
        return CellValue::Error(CellError::InvalidReference);
    }

    match position(lookup_value, &keys, approximate) {
        Ok(row) => table[row].get(col_index - 1).cloned().unwrap_or_default(),
        Err(e) => e,
    }
}

/// HLOOKUP - search the first row of `table`, return row `row_index` (1-based)
pub fn hlookup(
    lookup_value: &CellValue,
    table: &[Vec<CellValue>],
    row_index: usize,
    approximate: bool,
) -> CellValue {
    let keys = match table.first() {
        Some(row) => row.as_slice(),
        None => return CellValue::Error(CellError::NotAvailable),
    };
    if row_index == 0 || row_index > table.len() {
        return CellValue::Error(CellError::InvalidReference);
    }

    match position(lookup_value, keys, approximate) {
        Ok(col) => table[row_index - 1].get(col).cloned().unwrap_or_default(),
        Err(e) => e,
    }
}

fn position(lookup_value: &CellValue, keys: &[CellValue], approximate: bool) -> Result<usize, CellValue> {
    match match_fn(lookup_value, keys, if approximate { 1 } else { 0 }) {
        CellValue::Number(n) => Ok(n as usize - 1),
        other => Err(other),
    }
}

/// Compare same-typed values; text is case-insensitive. Mixed types are incomparable.
fn compare(a: &CellValue, b: &CellValue) -> Option<Ordering> {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => Some(x.to_lowercase().cmp(&y.to_lowercase())),
        (CellValue::Boolean(x), CellValue::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_match_exact() {
        let array = vec![n(10.0), n(20.0), n(30.0)];
        assert_eq!(match_fn(&n(20.0), &array, 0), n(2.0));
        assert_eq!(
            match_fn(&n(25.0), &array, 0),
            CellValue::Error(CellError::NotAvailable)
        );
        let words = vec![t("Apple"), t("Banana")];
        assert_eq!(match_fn(&t("banana"), &words, 0), n(2.0));
    }

    #[test]
    fn test_match_approximate() {
        let ascending = vec![n(10.0), n(20.0), n(30.0)];
        assert_eq!(match_fn(&n(25.0), &ascending, 1), n(2.0));
        assert_eq!(match_fn(&n(35.0), &ascending, 1), n(3.0));
        assert_eq!(
            match_fn(&n(9.0), &ascending, 1),
            CellValue::Error(CellError::NotAvailable)
        );

        let descending = vec![n(30.0), n(20.0), n(10.0)];
        assert_eq!(match_fn(&n(25.0), &descending, -1), n(1.0));
        assert_eq!(match_fn(&n(5.0), &descending, -1), n(3.0));
    }

    #[test]
    fn test_vlookup() {
        let table = vec![
            vec![n(10.0), t("Alice"), n(85.0)],
            vec![n(20.0), t("Bob"), n(90.0)],
            vec![n(30.0), t("Carol"), n(75.0)],
        ];
        assert_eq!(vlookup(&n(20.0), &table, 2, false), t("Bob"));
        assert_eq!(vlookup(&n(25.0), &table, 3, true), n(90.0));
        assert_eq!(
            vlookup(&n(20.0), &table, 4, false),
            CellValue::Error(CellError::InvalidReference)
        );
    }

    #[test]
    fn test_hlookup() {
        let table = vec![
            vec![t("Product A"), t("Product B")],
            vec![n(100.0), n(200.0)],
        ];
        assert_eq!(hlookup(&t("product b"), &table, 2, false), n(200.0));
    }
}
