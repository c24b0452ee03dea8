use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::functions;
use crate::resolver::ReferenceResolver;
use notebook_core::{CellError, CellValue};

/// Evaluator for formula AST
///
/// Every cell read goes through the resolver, which decides what a
/// reference means (a literal, a computed formula, a cycle).
pub struct Evaluator<'r, R>
where
    R: ReferenceResolver + ?Sized,
{
    resolver: &'r R,
}

impl<'r, R> Evaluator<'r, R>
where
    R: ReferenceResolver + ?Sized,
{
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Evaluate an expression AST to a value
    pub fn evaluate(&self, expr: &Expr) -> CellValue {
        match expr {
            Expr::Number(n) => finite(CellValue::Number(*n)),
            Expr::String(s) => CellValue::Text(s.clone()),
            Expr::Boolean(b) => CellValue::Boolean(*b),
            Expr::Error(e) => CellValue::Error(e.clone()),

            Expr::CellRef { coord, .. } => self.resolver.resolve_cell(*coord),

            // Bare ranges only make sense as function arguments
            Expr::Range { .. } => CellValue::Error(CellError::InvalidValue),

            Expr::SheetRef { .. } => CellValue::Error(CellError::InvalidReference),

            Expr::Binary { left, op, right } => self.evaluate_binary(left, *op, right),

            Expr::Unary { op, operand } => self.evaluate_unary(*op, operand),

            Expr::FunctionCall { name, args } => finite(self.evaluate_function(name, args)),

            Expr::Grouped(inner) => self.evaluate(inner),
        }
    }

    fn evaluate_binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> CellValue {
        let left_val = self.evaluate(left);
        let right_val = self.evaluate(right);

        if let CellValue::Error(e) = &left_val {
            return CellValue::Error(e.clone());
        }
        if let CellValue::Error(e) = &right_val {
            return CellValue::Error(e.clone());
        }

        match op {
            BinaryOp::Add => numeric_op(&left_val, &right_val, |a, b| a + b),
            BinaryOp::Sub => numeric_op(&left_val, &right_val, |a, b| a - b),
            BinaryOp::Mul => numeric_op(&left_val, &right_val, |a, b| a * b),
            BinaryOp::Div => match (left_val.coerce_number(), right_val.coerce_number()) {
                (Some(_), Some(b)) if b == 0.0 => CellValue::Error(CellError::DivisionByZero),
                (Some(_), Some(_)) => numeric_op(&left_val, &right_val, |a, b| a / b),
                _ => CellValue::Error(CellError::InvalidValue),
            },
            BinaryOp::Pow => numeric_op(&left_val, &right_val, f64::powf),

            BinaryOp::Concat => {
                CellValue::Text(format!("{}{}", left_val.as_text(), right_val.as_text()))
            }

            BinaryOp::Eq => CellValue::Boolean(compare_values(&left_val, &right_val).is_eq()),
            BinaryOp::Ne => CellValue::Boolean(compare_values(&left_val, &right_val).is_ne()),
            BinaryOp::Lt => CellValue::Boolean(compare_values(&left_val, &right_val).is_lt()),
            BinaryOp::Gt => CellValue::Boolean(compare_values(&left_val, &right_val).is_gt()),
            BinaryOp::Le => CellValue::Boolean(compare_values(&left_val, &right_val).is_le()),
            BinaryOp::Ge => CellValue::Boolean(compare_values(&left_val, &right_val).is_ge()),
        }
    }

    fn evaluate_unary(&self, op: UnaryOp, operand: &Expr) -> CellValue {
        let value = self.evaluate(operand);

        if let CellValue::Error(e) = &value {
            return CellValue::Error(e.clone());
        }

        let Some(n) = value.coerce_number() else {
            return CellValue::Error(CellError::InvalidValue);
        };

        match op {
            UnaryOp::Neg => CellValue::Number(-n),
            UnaryOp::Pos => CellValue::Number(n),
            UnaryOp::Percent => CellValue::Number(n / 100.0),
        }
    }

    fn evaluate_function(&self, name: &str, args: &[Expr]) -> CellValue {
        match name {
            // Short-circuiting forms evaluate only the branch they need
            "IF" => return self.evaluate_if(args),
            "IFERROR" => {
                return match args.first().map(|a| self.evaluate(a)) {
                    None => CellValue::Error(CellError::InvalidValue),
                    Some(CellValue::Error(_)) => args
                        .get(1)
                        .map_or(CellValue::Empty, |fallback| self.evaluate(fallback)),
                    Some(value) => value,
                };
            }

            "COUNTIF" | "SUMIF" | "AVERAGEIF" => return self.evaluate_conditional(name, args),
            "MATCH" => return self.evaluate_match(args),
            "VLOOKUP" | "HLOOKUP" => return self.evaluate_lookup(name, args),
            _ => {}
        }

        let values: Vec<CellValue> = args
            .iter()
            .flat_map(|arg| self.expand_argument(arg))
            .collect();

        match name {
            // Math functions
            "SUM" => functions::math::sum(&values),
            "AVERAGE" | "AVG" => functions::math::average(&values),
            "COUNT" => functions::math::count(&values),
            "COUNTA" => functions::math::counta(&values),
            "MIN" => functions::math::min(&values),
            "MAX" => functions::math::max(&values),
            "ABS" => functions::math::abs(&values),
            "ROUND" => functions::math::round(&values),
            "FLOOR" => functions::math::floor(&values),
            "CEILING" | "CEIL" => functions::math::ceiling(&values),
            "SQRT" => functions::math::sqrt(&values),
            "POWER" | "POW" => functions::math::power(&values),

            // Logical functions
            "AND" => functions::logical::and(&values),
            "OR" => functions::logical::or(&values),
            "NOT" => functions::logical::not(&values),
            "TRUE" => CellValue::Boolean(true),
            "FALSE" => CellValue::Boolean(false),
            "ISERROR" => functions::logical::is_error(&values),
            "ISBLANK" => functions::logical::is_blank(&values),

            // Text functions
            "CONCAT" | "CONCATENATE" => functions::text::concat(&values),
            "LEN" => functions::text::len(&values),
            "UPPER" => functions::text::upper(&values),
            "LOWER" => functions::text::lower(&values),
            "TRIM" => functions::text::trim(&values),
            "LEFT" => functions::text::left(&values),
            "RIGHT" => functions::text::right(&values),
            "MID" => functions::text::mid(&values),

            _ => CellValue::Error(CellError::InvalidName),
        }
    }

    fn evaluate_if(&self, args: &[Expr]) -> CellValue {
        let Some(condition) = args.first() else {
            return CellValue::Error(CellError::InvalidValue);
        };

        match functions::logical::condition(&self.evaluate(condition)) {
            Err(e) => e,
            Ok(true) => args
                .get(1)
                .map_or(CellValue::Boolean(true), |branch| self.evaluate(branch)),
            Ok(false) => args
                .get(2)
                .map_or(CellValue::Boolean(false), |branch| self.evaluate(branch)),
        }
    }

    fn evaluate_conditional(&self, name: &str, args: &[Expr]) -> CellValue {
        if args.len() < 2 {
            return CellValue::Error(CellError::InvalidValue);
        }

        let criteria_range = self.expand_argument(&args[0]);
        let criteria = self.evaluate(&args[1]);
        let target = args.get(2).map(|arg| self.expand_argument(arg));

        match name {
            "COUNTIF" => functions::math::countif(&criteria_range, &criteria),
            "SUMIF" => functions::math::sumif(&criteria_range, &criteria, target.as_deref()),
            _ => functions::math::averageif(&criteria_range, &criteria, target.as_deref()),
        }
    }

    fn evaluate_match(&self, args: &[Expr]) -> CellValue {
        if args.len() < 2 {
            return CellValue::Error(CellError::InvalidValue);
        }

        let lookup_value = self.evaluate(&args[0]);
        let lookup_array = self.expand_argument(&args[1]);
        let match_type = match args.get(2).map(|arg| self.evaluate(arg)) {
            None => 1,
            Some(CellValue::Error(e)) => return CellValue::Error(e),
            Some(value) => match value.coerce_number() {
                Some(n) => n.signum() as i32 * (n != 0.0) as i32,
                None => return CellValue::Error(CellError::InvalidValue),
            },
        };

        functions::lookup::match_fn(&lookup_value, &lookup_array, match_type)
    }

    fn evaluate_lookup(&self, name: &str, args: &[Expr]) -> CellValue {
        if args.len() < 3 {
            return CellValue::Error(CellError::InvalidValue);
        }

        let lookup_value = self.evaluate(&args[0]);
        let table = self.expand_matrix(&args[1]);
        if let Some(err) = table.iter().flatten().find(|v| v.is_error()) {
            return err.clone();
        }

        let index = match self.evaluate(&args[2]) {
            CellValue::Error(e) => return CellValue::Error(e),
            value => match value.coerce_number() {
                Some(n) if n >= 1.0 => n as usize,
                _ => return CellValue::Error(CellError::InvalidValue),
            },
        };

        let approximate = match args.get(3).map(|arg| self.evaluate(arg)) {
            None => true,
            Some(CellValue::Boolean(b)) => b,
            Some(CellValue::Number(n)) => n != 0.0,
            Some(CellValue::Empty) => false,
            Some(CellValue::Error(e)) => return CellValue::Error(e),
            Some(CellValue::Text(_)) => return CellValue::Error(CellError::InvalidValue),
        };

        if name == "VLOOKUP" {
            functions::lookup::vlookup(&lookup_value, &table, index, approximate)
        } else {
            functions::lookup::hlookup(&lookup_value, &table, index, approximate)
        }
    }

    /// Expand an argument, flattening ranges row-major
    fn expand_argument(&self, expr: &Expr) -> Vec<CellValue> {
        match expr {
            Expr::Range { .. } => match expr.as_cell_range() {
                Some(range) => self.resolver.resolve_range(range).into_iter().flatten().collect(),
                None => vec![CellValue::Error(CellError::InvalidReference)],
            },
            _ => vec![self.evaluate(expr)],
        }
    }

    /// Expand an argument keeping its rectangular shape
    fn expand_matrix(&self, expr: &Expr) -> Vec<Vec<CellValue>> {
        match expr {
            Expr::Range { .. } => match expr.as_cell_range() {
                Some(range) => self.resolver.resolve_range(range),
                None => vec![vec![CellValue::Error(CellError::InvalidReference)]],
            },
            _ => vec![vec![self.evaluate(expr)]],
        }
    }
}

/// Maps NaN and infinite numbers to `#NUM!`
fn finite(value: CellValue) -> CellValue {
    match value {
        CellValue::Number(n) if !n.is_finite() => CellValue::Error(CellError::NumError),
        other => other,
    }
}

fn numeric_op(left: &CellValue, right: &CellValue, op: impl Fn(f64, f64) -> f64) -> CellValue {
    match (left.coerce_number(), right.coerce_number()) {
        (Some(a), Some(b)) => {
            let result = op(a, b);
            if result.is_finite() {
                CellValue::Number(result)
            } else {
                CellValue::Error(CellError::NumError)
            }
        }
        _ => CellValue::Error(CellError::InvalidValue),
    }
}

/// Comparison used by `=`, `<>`, `<` and friends. A blank takes the type of
/// the other side; otherwise mixed types fall back to their text.
fn compare_values(left: &CellValue, right: &CellValue) -> Ordering {
    match (left, right) {
        (CellValue::Number(a), CellValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (CellValue::Text(a), CellValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (CellValue::Boolean(a), CellValue::Boolean(b)) => a.cmp(b),
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, CellValue::Number(_)) => compare_values(&CellValue::Number(0.0), right),
        (CellValue::Number(_), CellValue::Empty) => compare_values(left, &CellValue::Number(0.0)),
        (CellValue::Empty, CellValue::Boolean(_)) => compare_values(&CellValue::Boolean(false), right),
        (CellValue::Boolean(_), CellValue::Empty) => compare_values(left, &CellValue::Boolean(false)),
        _ => left
            .as_text()
            .to_lowercase()
            .cmp(&right.as_text().to_lowercase()),
    }
}
