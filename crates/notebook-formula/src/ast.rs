use notebook_core::{col_to_label, CellCoord, CellError, CellRange};

/// Abstract Syntax Tree for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    /// Single cell reference, already translated to zero-based coordinates
    CellRef {
        coord: CellCoord,
        abs_col: bool, // $A1 vs A1
        abs_row: bool, // A$1 vs A1
    },

    /// Range reference (e.g., A1:B10); both ends are `CellRef`
    Range { start: Box<Expr>, end: Box<Expr> },

    /// Reference qualified by a sheet name (e.g., Sheet1!A1)
    SheetRef {
        sheet_name: String,
        reference: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Function call (e.g., SUM(A1:A10)); name is upper-cased by the parser
    FunctionCall { name: String, args: Vec<Expr> },

    Grouped(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,

    // String
    Concat,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,     // -
    Pos,     // +
    Percent, // %
}

impl Expr {
    /// Create a cell reference expression from zero-based indices
    pub fn cell_ref(row: u32, col: u32) -> Self {
        Expr::CellRef {
            coord: CellCoord::new(row, col),
            abs_col: false,
            abs_row: false,
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn range(start: Expr, end: Expr) -> Self {
        Expr::Range {
            start: Box::new(start),
            end: Box::new(end),
        }
    }

    /// The normalized rectangle of a `Range` whose ends are cell references
    pub fn as_cell_range(&self) -> Option<CellRange> {
        match self {
            Expr::Range { start, end } => match (start.as_ref(), end.as_ref()) {
                (Expr::CellRef { coord: a, .. }, Expr::CellRef { coord: b, .. }) => {
                    Some(CellRange::new(*a, *b))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Visit every single-cell and range reference in the tree
    pub fn walk_references(&self, visit: &mut impl FnMut(CellRange)) {
        match self {
            Expr::CellRef { coord, .. } => visit(CellRange::single(*coord)),
            Expr::Range { .. } => {
                if let Some(range) = self.as_cell_range() {
                    visit(range);
                }
            }
            Expr::Binary { left, right, .. } => {
                left.walk_references(visit);
                right.walk_references(visit);
            }
            Expr::Unary { operand, .. } => operand.walk_references(visit),
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.walk_references(visit);
                }
            }
            Expr::Grouped(inner) => inner.walk_references(visit),
            // Other sheets are not part of this grid
            Expr::SheetRef { .. } => {}
            Expr::Number(_) | Expr::String(_) | Expr::Boolean(_) | Expr::Error(_) => {}
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Expr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::Error(e) => write!(f, "{}", e),
            Expr::CellRef {
                coord,
                abs_col,
                abs_row,
            } => write!(
                f,
                "{}{}{}{}",
                if *abs_col { "$" } else { "" },
                col_to_label(coord.col),
                if *abs_row { "$" } else { "" },
                coord.row + 1
            ),
            Expr::Range { start, end } => write!(f, "{}:{}", start, end),
            Expr::SheetRef {
                sheet_name,
                reference,
            } => {
                if sheet_name.contains(' ') || sheet_name.contains('!') {
                    write!(f, "'{}'!{}", sheet_name.replace('\'', "''"), reference)
                } else {
                    write!(f, "{}!{}", sheet_name, reference)
                }
            }
            Expr::Binary { left, op, right } => write!(f, "{}{}{}", left, op, right),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::Pos => write!(f, "+{}", operand),
                UnaryOp::Percent => write!(f, "{}%", operand),
            },
            Expr::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Grouped(inner) => write!(f, "({})", inner),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_references() {
        let expr = Expr::function(
            "SUM",
            vec![Expr::range(Expr::cell_ref(0, 0), Expr::cell_ref(9, 1))],
        );
        assert_eq!(expr.to_string(), "SUM(A1:B10)");
    }

    #[test]
    fn test_walk_references() {
        let expr = Expr::binary(
            Expr::cell_ref(0, 2),
            BinaryOp::Add,
            Expr::function(
                "SUM",
                vec![Expr::range(Expr::cell_ref(3, 0), Expr::cell_ref(1, 0))],
            ),
        );
        let mut seen = Vec::new();
        expr.walk_references(&mut |r| seen.push(r.to_a1()));
        assert_eq!(seen, vec!["C1", "A2:A4"]);
    }
}
