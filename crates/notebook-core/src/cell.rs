use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::CellError;

/// A scalar held by a cell, either literal or computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl CellValue {
    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Number used by arithmetic operators; a blank cell counts as zero.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => Some(0.0),
            other => other.as_number(),
        }
    }

    /// Try to get the value as a string
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Error(e) => e.to_string(),
        }
    }

    /// Ordering used by grid sorting: numeric when both sides are numbers,
    /// otherwise case-insensitive comparison of the display text. Numbers
    /// sort ahead of everything else, which keeps the order total.
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,
            _ => self
                .as_text()
                .to_lowercase()
                .cmp(&other.as_text().to_lowercase()),
        }
    }
}

/// One grid position.
///
/// When `formula` is set, `value` holds the last computed result and is never
/// authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self::from_value(value)
    }

    /// Create a cell with a number value
    pub fn number(value: f64) -> Self {
        Cell::new(CellValue::Number(value))
    }

    /// Create a cell with a text value. Text beginning with `=` becomes a formula.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::new(CellValue::Text(value.into()))
    }

    /// Create a cell with a boolean value
    pub fn boolean(value: bool) -> Self {
        Cell::new(CellValue::Boolean(value))
    }

    /// Create a cell with a formula
    pub fn formula(expression: impl Into<String>) -> Self {
        Cell {
            value: CellValue::Empty,
            formula: Some(expression.into()),
            read_only: false,
        }
    }

    /// Create a cell from raw user input (see [`parse_cell_input`])
    pub fn from_input(input: &str) -> Self {
        Cell::new(parse_cell_input(input))
    }

    fn from_value(value: CellValue) -> Self {
        let mut cell = Cell::default();
        cell.assign(value);
        cell
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Store a value, tagging it as a formula when it is text starting with `=`.
    ///
    /// A formula resets the cached value so the next pass recomputes it; any
    /// other value clears the formula tag.
    pub fn assign(&mut self, value: CellValue) {
        match value {
            CellValue::Text(s) if is_formula_text(&s) => {
                self.formula = Some(s);
                self.value = CellValue::Empty;
            }
            other => {
                self.formula = None;
                self.value = other;
            }
        }
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Get the formula expression if this is a formula
    pub fn formula_expression(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Check if the cell holds nothing
    pub fn is_empty(&self) -> bool {
        self.formula.is_none() && self.value.is_empty()
    }
}

/// True for strings that the store treats as formulas
pub fn is_formula_text(s: &str) -> bool {
    s.starts_with('=')
}

/// Parse raw user input into a cell value.
///
/// Formulas stay text (the store tags them), `TRUE`/`FALSE` become booleans,
/// anything `f64` accepts becomes a number, blank becomes `Empty`.
pub fn parse_cell_input(input: &str) -> CellValue {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return CellValue::Empty;
    }

    if is_formula_text(trimmed) {
        return CellValue::Text(trimmed.to_string());
    }

    match trimmed.to_uppercase().as_str() {
        "TRUE" => return CellValue::Boolean(true),
        "FALSE" => return CellValue::Boolean(false),
        _ => {}
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        if num.is_finite() {
            return CellValue::Number(num);
        }
    }

    CellValue::Text(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_as_number() {
        assert_eq!(CellValue::Number(42.0).as_number(), Some(42.0));
        assert_eq!(CellValue::Boolean(true).as_number(), Some(1.0));
        assert_eq!(CellValue::Text("123".to_string()).as_number(), Some(123.0));
        assert_eq!(CellValue::Empty.as_number(), None);
        assert_eq!(CellValue::Empty.coerce_number(), Some(0.0));
    }

    #[test]
    fn test_cell_value_as_text() {
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(42.5).as_text(), "42.5");
        assert_eq!(CellValue::Boolean(true).as_text(), "TRUE");
        assert_eq!(CellValue::Text("hello".to_string()).as_text(), "hello");
    }

    #[test]
    fn test_sort_cmp() {
        assert_eq!(
            CellValue::Number(9.0).sort_cmp(&CellValue::Number(10.0)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::from("1a").sort_cmp(&CellValue::Number(9.0)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::Boolean(true).sort_cmp(&CellValue::from("abc")),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::from("apple").sort_cmp(&CellValue::from("Banana")),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_cmp_is_total_for_nan() {
        let mut values = vec![
            CellValue::Number(3.0),
            CellValue::Number(f64::NAN),
            CellValue::Number(1.0),
            CellValue::Number(2.0),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));

        let numbers: Vec<f64> = values.iter().filter_map(CellValue::as_number).collect();
        assert_eq!(&numbers[..3], &[1.0, 2.0, 3.0]);
        assert!(numbers[3].is_nan());
    }

    #[test]
    fn test_assign_tags_formulas() {
        let mut cell = Cell::number(3.0);
        cell.assign(CellValue::from("=A1+1"));
        assert_eq!(cell.formula_expression(), Some("=A1+1"));
        assert_eq!(cell.value, CellValue::Empty);

        cell.assign(CellValue::Number(7.0));
        assert!(!cell.is_formula());
        assert_eq!(cell.value, CellValue::Number(7.0));
    }

    #[test]
    fn test_parse_cell_input() {
        assert_eq!(parse_cell_input("42"), CellValue::Number(42.0));
        assert_eq!(parse_cell_input(" true "), CellValue::Boolean(true));
        assert_eq!(parse_cell_input(""), CellValue::Empty);
        assert_eq!(parse_cell_input("=SUM(A1:A3)"), CellValue::from("=SUM(A1:A3)"));
        assert_eq!(parse_cell_input("hello"), CellValue::from("hello"));
        assert_eq!(parse_cell_input("inf"), CellValue::from("inf"));
    }

    #[test]
    fn test_cell_serde_shape() {
        let cell = Cell::formula("=A1*2").read_only();
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["formula"], "=A1*2");
        assert_eq!(json["readOnly"], true);

        let plain = serde_json::to_value(Cell::number(1.0)).unwrap();
        assert!(plain.get("readOnly").is_none());
        assert!(plain.get("formula").is_none());
    }
}
