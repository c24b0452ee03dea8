pub mod ast;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod pass;
pub mod resolver;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use evaluator::Evaluator;
pub use parser::{FormulaParser, ParseError};
pub use pass::{CellState, EvaluationPass, MAX_PADDED_RANGE_CELLS};
pub use resolver::{NoReferences, ReferenceResolver};

use notebook_core::{CellCoord, CellError, CellValue};

/// Parse and evaluate a formula expression against `resolver`.
///
/// Text that does not parse evaluates to the generic syntax error.
pub fn evaluate_formula<R>(expression: &str, resolver: &R) -> CellValue
where
    R: ReferenceResolver + ?Sized,
{
    match FormulaParser::new().parse(expression) {
        Ok(ast) => Evaluator::new(resolver).evaluate(&ast),
        Err(_) => CellValue::Error(CellError::Syntax),
    }
}

/// Every cell a formula reads, ranges expanded, in first-seen order
pub fn extract_references(expression: &str) -> Vec<CellCoord> {
    let Ok(ast) = FormulaParser::new().parse(expression) else {
        return vec![];
    };

    let mut refs = Vec::new();
    ast.walk_references(&mut |range| {
        for coord in range.iter() {
            if !refs.contains(&coord) {
                refs.push(coord);
            }
        }
    });
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_formula() {
        let value = evaluate_formula("=A1 * 3", &|_: CellCoord| CellValue::Number(2.0));
        assert_eq!(value, CellValue::Number(6.0));

        assert_eq!(
            evaluate_formula("=(1", &NoReferences),
            CellValue::Error(CellError::Syntax)
        );
    }

    #[test]
    fn test_extract_references() {
        let refs = extract_references("=SUM(A1:B2) + A1 * $C$3");
        let labels: Vec<String> = refs.iter().map(CellCoord::to_a1).collect();
        assert_eq!(labels, vec!["A1", "B1", "A2", "B2", "C3"]);

        assert!(extract_references("=1+").is_empty());
        assert!(extract_references("=Sheet2!A1").is_empty());
    }
}
