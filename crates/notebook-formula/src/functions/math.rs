use notebook_core::{CellError, CellValue};

use super::{arg_number, propagate_error};

/// SUM - Sum all numeric values; text and blanks are skipped
pub fn sum(values: &[CellValue]) -> CellValue {
    let mut total = 0.0;

    for value in values {
        match value {
            CellValue::Number(n) => total += n,
            CellValue::Boolean(b) => total += if *b { 1.0 } else { 0.0 },
            CellValue::Error(e) => return CellValue::Error(e.clone()),
            _ => {}
        }
    }

    CellValue::Number(total)
}

/// AVERAGE - Average of numeric values
pub fn average(values: &[CellValue]) -> CellValue {
    let mut total = 0.0;
    let mut count = 0;

    for value in values {
        match value {
            CellValue::Number(n) => {
                total += n;
                count += 1;
            }
            CellValue::Error(e) => return CellValue::Error(e.clone()),
            _ => {}
        }
    }

    if count == 0 {
        CellValue::Error(CellError::DivisionByZero)
    } else {
        CellValue::Number(total / count as f64)
    }
}

/// COUNT - Count numeric values
pub fn count(values: &[CellValue]) -> CellValue {
    let count = values
        .iter()
        .filter(|v| matches!(v, CellValue::Number(_)))
        .count();

    CellValue::Number(count as f64)
}

/// COUNTA - Count non-empty values
pub fn counta(values: &[CellValue]) -> CellValue {
    let count = values.iter().filter(|v| !v.is_empty()).count();
    CellValue::Number(count as f64)
}

fn fold_numbers(values: &[CellValue], pick: fn(f64, f64) -> f64) -> CellValue {
    let mut result: Option<f64> = None;

    for value in values {
        match value {
            CellValue::Number(n) => result = Some(result.map_or(*n, |r| pick(r, *n))),
            CellValue::Error(e) => return CellValue::Error(e.clone()),
            _ => {}
        }
    }

    CellValue::Number(result.unwrap_or(0.0))
}

/// MIN - Minimum numeric value (0 when there are none)
pub fn min(values: &[CellValue]) -> CellValue {
    fold_numbers(values, f64::min)
}

/// MAX - Maximum numeric value (0 when there are none)
pub fn max(values: &[CellValue]) -> CellValue {
    fold_numbers(values, f64::max)
}

/// ABS - Absolute value
pub fn abs(values: &[CellValue]) -> CellValue {
    match arg_number(values, 0) {
        Ok(n) => CellValue::Number(n.abs()),
        Err(e) => e,
    }
}

/// ROUND - Round to specified decimal places
pub fn round(values: &[CellValue]) -> CellValue {
    let num = match arg_number(values, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let decimals = if values.len() > 1 {
        match arg_number(values, 1) {
            Ok(d) => d as i32,
            Err(e) => return e,
        }
    } else {
        0
    };

    let factor = 10_f64.powi(decimals);
    if factor == 0.0 {
        return CellValue::Number(0.0);
    }
    let scaled = num * factor;
    if !scaled.is_finite() {
        // More places than an f64 carries
        return CellValue::Number(num);
    }
    CellValue::Number(scaled.round() / factor)
}

fn to_multiple(values: &[CellValue], step: fn(f64) -> f64) -> CellValue {
    let num = match arg_number(values, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let significance = if values.len() > 1 {
        match arg_number(values, 1) {
            Ok(s) => s,
            Err(e) => return e,
        }
    } else {
        1.0
    };

    if significance == 0.0 {
        return CellValue::Error(CellError::DivisionByZero);
    }

    CellValue::Number(step(num / significance) * significance)
}

/// FLOOR - Round down to a multiple of significance
pub fn floor(values: &[CellValue]) -> CellValue {
    to_multiple(values, f64::floor)
}

/// CEILING - Round up to a multiple of significance
pub fn ceiling(values: &[CellValue]) -> CellValue {
    to_multiple(values, f64::ceil)
}

/// SQRT - Square root
pub fn sqrt(values: &[CellValue]) -> CellValue {
    match arg_number(values, 0) {
        Ok(n) if n >= 0.0 => CellValue::Number(n.sqrt()),
        Ok(_) => CellValue::Error(CellError::NumError),
        Err(e) => e,
    }
}

/// POWER - Raise to power
pub fn power(values: &[CellValue]) -> CellValue {
    let (base, exp) = match (arg_number(values, 0), arg_number(values, 1)) {
        (Ok(b), Ok(e)) => (b, e),
        (Err(e), _) | (_, Err(e)) => return e,
    };

    let result = base.powf(exp);
    if result.is_finite() {
        CellValue::Number(result)
    } else {
        CellValue::Error(CellError::NumError)
    }
}

// =============================================================================
// Conditional aggregates
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum CriteriaOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// A COUNTIF-style criterion such as `">3"`, `"<>done"` or `5`
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    op: CriteriaOp,
    operand: CellValue,
}

impl Criteria {
    pub fn parse(criteria: &CellValue) -> Self {
        let text = match criteria {
            CellValue::Text(s) => s.as_str(),
            other => {
                return Criteria {
                    op: CriteriaOp::Eq,
                    operand: other.clone(),
                }
            }
        };

        let (op, rest) = [
            ("<=", CriteriaOp::Le),
            (">=", CriteriaOp::Ge),
            ("<>", CriteriaOp::Ne),
            ("<", CriteriaOp::Lt),
            (">", CriteriaOp::Gt),
            ("=", CriteriaOp::Eq),
        ]
        .iter()
        .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((CriteriaOp::Eq, text));

        let operand = match rest.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) if rest.is_empty() => CellValue::Empty,
            Err(_) => CellValue::Text(rest.to_string()),
        };

        Criteria { op, operand }
    }

    pub fn matches(&self, value: &CellValue) -> bool {
        use std::cmp::Ordering;

        let ordering = match (value, &self.operand) {
            (CellValue::Empty, CellValue::Empty) => Some(Ordering::Equal),
            (_, CellValue::Number(target)) => match value {
                CellValue::Number(n) => n.partial_cmp(target),
                CellValue::Text(s) => s.trim().parse::<f64>().ok().and_then(|n| n.partial_cmp(target)),
                _ => None,
            },
            (CellValue::Text(s), CellValue::Text(target)) => {
                Some(s.to_lowercase().cmp(&target.to_lowercase()))
            }
            (CellValue::Boolean(a), CellValue::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        };

        match (self.op, ordering) {
            (CriteriaOp::Ne, None) => true,
            (_, None) => false,
            (CriteriaOp::Eq, Some(o)) => o == Ordering::Equal,
            (CriteriaOp::Ne, Some(o)) => o != Ordering::Equal,
            (CriteriaOp::Lt, Some(o)) => o == Ordering::Less,
            (CriteriaOp::Gt, Some(o)) => o == Ordering::Greater,
            (CriteriaOp::Le, Some(o)) => o != Ordering::Greater,
            (CriteriaOp::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

/// Values from `target` (or `range` itself) whose partner in `range` matches
fn select<'a>(
    range: &'a [CellValue],
    criteria: &CellValue,
    target: Option<&'a [CellValue]>,
) -> Result<Vec<CellValue>, CellValue> {
    if let Some(err) = propagate_error(std::slice::from_ref(criteria)) {
        return Err(err);
    }
    let criteria = Criteria::parse(criteria);
    let target = target.unwrap_or(range);

    Ok(range
        .iter()
        .zip(target)
        .filter(|(candidate, _)| criteria.matches(candidate))
        .map(|(_, value)| value.clone())
        .collect())
}

/// COUNTIF - Count cells matching a criterion
pub fn countif(range: &[CellValue], criteria: &CellValue) -> CellValue {
    match select(range, criteria, None) {
        Ok(selected) => CellValue::Number(selected.len() as f64),
        Err(e) => e,
    }
}

/// SUMIF - Sum cells whose criteria partner matches
pub fn sumif(range: &[CellValue], criteria: &CellValue, sum_range: Option<&[CellValue]>) -> CellValue {
    match select(range, criteria, sum_range) {
        Ok(selected) => sum(&selected),
        Err(e) => e,
    }
}

/// AVERAGEIF - Average cells whose criteria partner matches
pub fn averageif(
    range: &[CellValue],
    criteria: &CellValue,
    avg_range: Option<&[CellValue]>,
) -> CellValue {
    match select(range, criteria, avg_range) {
        Ok(selected) => average(&selected),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<CellValue> {
        values.iter().map(|n| CellValue::Number(*n)).collect()
    }

    #[test]
    fn test_sum_and_average() {
        assert_eq!(sum(&nums(&[1.0, 2.0, 3.0, 4.0])), CellValue::Number(10.0));
        assert_eq!(average(&nums(&[1.0, 2.0, 3.0, 4.0])), CellValue::Number(2.5));
        assert_eq!(
            average(&[CellValue::Empty]),
            CellValue::Error(CellError::DivisionByZero)
        );
    }

    #[test]
    fn test_sum_propagates_errors() {
        let values = vec![CellValue::Number(1.0), CellValue::Error(CellError::NumError)];
        assert_eq!(sum(&values), CellValue::Error(CellError::NumError));
    }

    #[test]
    fn test_count() {
        let values = vec![
            CellValue::Number(1.0),
            CellValue::from("hello"),
            CellValue::Number(2.0),
            CellValue::Empty,
        ];
        assert_eq!(count(&values), CellValue::Number(2.0));
        assert_eq!(counta(&values), CellValue::Number(3.0));
    }

    #[test]
    fn test_min_max() {
        let values = nums(&[5.0, 2.0, 8.0]);
        assert_eq!(min(&values), CellValue::Number(2.0));
        assert_eq!(max(&values), CellValue::Number(8.0));
        assert_eq!(max(&[]), CellValue::Number(0.0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round(&nums(&[3.14159, 2.0])), CellValue::Number(3.14));
        assert_eq!(round(&nums(&[1.0, 400.0])), CellValue::Number(1.0));
        assert_eq!(round(&nums(&[1234.0, -400.0])), CellValue::Number(0.0));
        assert_eq!(floor(&nums(&[7.0, 5.0])), CellValue::Number(5.0));
        assert_eq!(ceiling(&nums(&[7.0, 5.0])), CellValue::Number(10.0));
        assert_eq!(
            floor(&nums(&[7.0, 0.0])),
            CellValue::Error(CellError::DivisionByZero)
        );
    }

    #[test]
    fn test_criteria() {
        let values = nums(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(countif(&values, &CellValue::from(">3")), CellValue::Number(1.0));
        assert_eq!(sumif(&values, &CellValue::from(">=2"), None), CellValue::Number(9.0));
        assert_eq!(
            averageif(&values, &CellValue::from(">=2"), None),
            CellValue::Number(3.0)
        );
        assert_eq!(countif(&values, &CellValue::Number(2.0)), CellValue::Number(1.0));

        let labels = vec![CellValue::from("a"), CellValue::from("B"), CellValue::from("a")];
        assert_eq!(
            sumif(&labels, &CellValue::from("A"), Some(&values)),
            CellValue::Number(4.0)
        );
        assert_eq!(countif(&labels, &CellValue::from("<>a")), CellValue::Number(1.0));
    }
}
