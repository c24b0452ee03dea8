use notebook_core::{CellCoord, CellRange, CellValue};

/// Supplies the values a formula references.
///
/// The evaluator only ever sees cells through this boundary, so the grammar
/// can be swapped without touching caching or cycle handling.
pub trait ReferenceResolver {
    /// Current value of one cell. Coordinates outside the grid resolve to `Empty`.
    fn resolve_cell(&self, coord: CellCoord) -> CellValue;

    /// Values of an inclusive rectangle, row-major (`result[row][col]`).
    fn resolve_range(&self, range: CellRange) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.resolve_cell(CellCoord::new(row, col)))
                    .collect()
            })
            .collect()
    }
}

impl<F> ReferenceResolver for F
where
    F: Fn(CellCoord) -> CellValue,
{
    fn resolve_cell(&self, coord: CellCoord) -> CellValue {
        self(coord)
    }
}

/// Resolver for formulas that must not reference anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

impl ReferenceResolver for NoReferences {
    fn resolve_cell(&self, _coord: CellCoord) -> CellValue {
        CellValue::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_is_row_major() {
        let resolver = |c: CellCoord| CellValue::Number((c.row * 10 + c.col) as f64);
        let range = CellRange::from_a1("B1:C2").unwrap();

        let values = resolver.resolve_range(range);
        assert_eq!(
            values,
            vec![
                vec![CellValue::Number(1.0), CellValue::Number(2.0)],
                vec![CellValue::Number(11.0), CellValue::Number(12.0)],
            ]
        );
    }
}
