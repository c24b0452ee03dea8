//! One full recomputation of a grid.
//!
//! A pass computes formula cells on demand and memoizes every result. Cells
//! whose evaluation has started but not finished are marked in progress; a
//! reference back to one of them is a circular reference.
//!
//! Dependencies are followed with an explicit work stack rather than native
//! recursion. An attempt to evaluate a cell stops at the first read of a
//! formula cell that has not been computed yet (for a range read, every such
//! cell in the range); those cells are pushed in reading order and the
//! attempt is retried once they settle. Only references an evaluation
//! actually reads are followed, so `IF` branches not taken are never visited.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use notebook_core::{CellCoord, CellError, CellRange, CellValue, Grid};
use tracing::{debug, trace};

use crate::ast::Expr;
use crate::evaluator::Evaluator;
use crate::parser::FormulaParser;
use crate::resolver::ReferenceResolver;

/// Ranges up to this many cells keep their written shape, with blanks past
/// the grid edge. Larger ranges are clipped to the grid.
pub const MAX_PADDED_RANGE_CELLS: u64 = 1 << 16;

/// Per-cell state within a single pass. Absence from the map means unvisited.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    InProgress,
    Done(CellValue),
    Errored(CellError),
}

impl CellState {
    fn value(&self) -> Option<CellValue> {
        match self {
            CellState::InProgress => None,
            CellState::Done(v) => Some(v.clone()),
            CellState::Errored(e) => Some(CellValue::Error(e.clone())),
        }
    }
}

/// Outcome of one attempt at evaluating a formula cell
enum Attempt {
    Settled(CellState),
    Blocked(Vec<CellCoord>),
}

/// Evaluation cache for one recomputation of `grid`.
///
/// Discard the pass after the grid changes; cached values are not invalidated.
pub struct EvaluationPass<'g> {
    grid: &'g Grid,
    parser: FormulaParser,
    states: RefCell<HashMap<CellCoord, CellState>>,
    asts: RefCell<HashMap<String, Rc<Result<Expr, CellError>>>>,
}

impl<'g> EvaluationPass<'g> {
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            parser: FormulaParser::new(),
            states: RefCell::new(HashMap::new()),
            asts: RefCell::new(HashMap::new()),
        }
    }

    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// Value of the cell at `coord`, computing it (and anything it
    /// references) if it holds a formula.
    pub fn evaluate(&self, coord: CellCoord) -> CellValue {
        if let Some(value) = self.settled(coord) {
            return value;
        }

        let mut stack = vec![coord];
        while let Some(&top) = stack.last() {
            if self.is_finished(top) {
                stack.pop();
                continue;
            }
            let expression = match self.grid.cell(top).and_then(|c| c.formula_expression()) {
                Some(expression) => expression,
                None => {
                    stack.pop();
                    continue;
                }
            };
            self.states.borrow_mut().insert(top, CellState::InProgress);

            match self.attempt(expression) {
                Attempt::Blocked(dependencies) => {
                    trace!(cell = %top.to_a1(), waiting_on = dependencies.len(), "deferred");
                    stack.extend(dependencies.into_iter().rev());
                }
                Attempt::Settled(state) => {
                    trace!(cell = %top.to_a1(), ?state, "evaluated");
                    self.states.borrow_mut().insert(top, state);
                    stack.pop();
                }
            }
        }

        self.settled(coord).unwrap_or(CellValue::Empty)
    }

    fn is_finished(&self, coord: CellCoord) -> bool {
        self.states
            .borrow()
            .get(&coord)
            .is_some_and(|state| *state != CellState::InProgress)
    }

    /// Value of `coord` if no evaluation is needed: memoized, in progress
    /// (a cycle), literal or outside the grid.
    fn settled(&self, coord: CellCoord) -> Option<CellValue> {
        if let Some(state) = self.states.borrow().get(&coord) {
            return Some(state.value().unwrap_or_else(|| {
                trace!(cell = %coord.to_a1(), "cycle detected");
                CellValue::Error(CellError::CircularReference)
            }));
        }

        match self.grid.cell(coord) {
            None => Some(CellValue::Empty),
            Some(cell) if cell.is_formula() => None,
            Some(cell) => Some(cell.value.clone()),
        }
    }

    fn attempt(&self, expression: &str) -> Attempt {
        let parsed = self.parse(expression);
        let ast = match &*parsed {
            Ok(ast) => ast,
            Err(e) => return Attempt::Settled(CellState::Errored(e.clone())),
        };

        let reads = SettledReads {
            pass: self,
            pending: RefCell::new(Vec::new()),
        };
        let value = Evaluator::new(&reads).evaluate(ast);

        let pending = reads.pending.into_inner();
        if !pending.is_empty() {
            return Attempt::Blocked(pending);
        }
        Attempt::Settled(match value {
            CellValue::Error(e) => CellState::Errored(e),
            value => CellState::Done(value),
        })
    }

    /// Values of `range`, clipped to the grid when it is larger than
    /// [`MAX_PADDED_RANGE_CELLS`]
    fn range_values(
        &self,
        range: CellRange,
        read: impl Fn(CellCoord) -> CellValue,
    ) -> Vec<Vec<CellValue>> {
        let (last_row, last_col) = if range.cell_count() <= MAX_PADDED_RANGE_CELLS {
            (range.end.row, range.end.col)
        } else {
            let (rows, cols) = (self.grid.row_count(), self.grid.col_count());
            if range.start.row >= rows || range.start.col >= cols {
                return Vec::new();
            }
            (range.end.row.min(rows - 1), range.end.col.min(cols - 1))
        };

        (range.start.row..=last_row)
            .map(|row| {
                (range.start.col..=last_col)
                    .map(|col| {
                        let coord = CellCoord::new(row, col);
                        if self.grid.contains(coord) {
                            read(coord)
                        } else {
                            CellValue::Empty
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Every cell's value, row-major
    pub fn evaluate_all(&self) -> Vec<Vec<CellValue>> {
        debug!(
            rows = self.grid.row_count(),
            cols = self.grid.col_count(),
            "evaluating grid"
        );

        let values: Vec<Vec<CellValue>> = (0..self.grid.row_count())
            .map(|row| {
                (0..self.grid.col_count())
                    .map(|col| self.evaluate(CellCoord::new(row, col)))
                    .collect()
            })
            .collect();

        debug_assert!(
            self.unfinished().is_empty(),
            "cells left in progress after a full pass"
        );
        values
    }

    /// Cells still marked in progress; empty whenever no evaluation is running
    pub fn unfinished(&self) -> Vec<CellCoord> {
        let mut coords: Vec<CellCoord> = self
            .states
            .borrow()
            .iter()
            .filter(|(_, state)| **state == CellState::InProgress)
            .map(|(coord, _)| *coord)
            .collect();
        coords.sort();
        coords
    }

    /// State of `coord` in this pass, if it has been visited
    pub fn state(&self, coord: CellCoord) -> Option<CellState> {
        self.states.borrow().get(&coord).cloned()
    }

    fn parse(&self, expression: &str) -> Rc<Result<Expr, CellError>> {
        if let Some(ast) = self.asts.borrow().get(expression) {
            return Rc::clone(ast);
        }

        let parsed = self.parser.parse(expression).map_err(|err| {
            debug!(%expression, %err, "formula failed to parse");
            CellError::Syntax
        });
        let parsed = Rc::new(parsed);
        self.asts
            .borrow_mut()
            .insert(expression.to_string(), Rc::clone(&parsed));
        parsed
    }
}

impl ReferenceResolver for EvaluationPass<'_> {
    fn resolve_cell(&self, coord: CellCoord) -> CellValue {
        self.evaluate(coord)
    }

    fn resolve_range(&self, range: CellRange) -> Vec<Vec<CellValue>> {
        self.range_values(range, |coord| self.evaluate(coord))
    }
}

/// Reads made by one evaluation attempt.
///
/// The first read that hits unsettled formula cells records them and sees
/// blanks; every later read sees blanks, and the attempt is discarded.
struct SettledReads<'p, 'g> {
    pass: &'p EvaluationPass<'g>,
    pending: RefCell<Vec<CellCoord>>,
}

impl SettledReads<'_, '_> {
    fn is_blocked(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    fn read(&self, coord: CellCoord) -> CellValue {
        self.pass.settled(coord).unwrap_or_else(|| {
            self.pending.borrow_mut().push(coord);
            CellValue::Empty
        })
    }
}

impl ReferenceResolver for SettledReads<'_, '_> {
    fn resolve_cell(&self, coord: CellCoord) -> CellValue {
        if self.is_blocked() {
            return CellValue::Empty;
        }
        self.read(coord)
    }

    fn resolve_range(&self, range: CellRange) -> Vec<Vec<CellValue>> {
        if self.is_blocked() {
            return self.pass.range_values(range, |_| CellValue::Empty);
        }
        self.pass.range_values(range, |coord| self.read(coord))
    }
}
