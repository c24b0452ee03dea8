use serde::{Deserialize, Serialize};

use crate::cell::{is_formula_text, parse_cell_input, Cell, CellValue};
use crate::error::GridError;
use crate::range::CellCoord;

/// Dense, rectangular cell store. Rows outer, columns inner, zero-based.
///
/// Writes past the current extent fail with [`GridError::OutOfRange`];
/// callers grow the grid explicitly with [`Grid::append_row`] and friends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    cols: u32,
}

impl From<Vec<Vec<Cell>>> for Grid {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Grid::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Cell>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}

impl Grid {
    /// Create a blank `rows` x `cols` grid
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: (0..rows).map(|_| blank_row(cols)).collect(),
            cols,
        }
    }

    /// Build a grid from row data, padding short rows with blank cells.
    ///
    /// Untagged `=...` text is tagged as a formula, as if it had been typed.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize_with(cols, Cell::default);
            for cell in row.iter_mut().filter(|c| needs_tagging(c)) {
                let value = std::mem::take(&mut cell.value);
                cell.assign(value);
            }
        }
        Self {
            rows,
            cols: cols as u32,
        }
    }

    /// Build a grid from raw user input strings (see [`parse_cell_input`])
    pub fn from_inputs<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Grid::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| Cell::from_input(s.as_ref())).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn col_count(&self) -> u32 {
        self.cols
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.is_within(self.row_count(), self.cols)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Get a cell, failing loudly when the coordinate is outside the grid
    pub fn get(&self, coord: CellCoord) -> Result<&Cell, GridError> {
        self.rows
            .get(coord.row as usize)
            .and_then(|row| row.get(coord.col as usize))
            .ok_or_else(|| self.out_of_range(coord))
    }

    /// Get a cell if the coordinate is inside the grid
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.get(coord).ok()
    }

    fn get_mut(&mut self, coord: CellCoord) -> Result<&mut Cell, GridError> {
        let err = self.out_of_range(coord);
        self.rows
            .get_mut(coord.row as usize)
            .and_then(|row| row.get_mut(coord.col as usize))
            .ok_or(err)
    }

    fn editable(&mut self, coord: CellCoord) -> Result<&mut Cell, GridError> {
        let cell = self.get_mut(coord)?;
        if cell.read_only {
            return Err(GridError::ReadOnly {
                row: coord.row,
                col: coord.col,
            });
        }
        Ok(cell)
    }

    /// Store a value. Text starting with `=` becomes a formula and its cached
    /// value is cleared; any other value clears the formula tag.
    pub fn set_value(&mut self, coord: CellCoord, value: CellValue) -> Result<(), GridError> {
        self.editable(coord)?.assign(value);
        Ok(())
    }

    /// Store raw user input, parsed the same way as typed text in the grid
    pub fn set_input(&mut self, coord: CellCoord, input: &str) -> Result<(), GridError> {
        self.set_value(coord, parse_cell_input(input))
    }

    /// Store a formula. A leading `=` is added when missing.
    pub fn set_formula(&mut self, coord: CellCoord, expression: &str) -> Result<(), GridError> {
        let expression = expression.trim();
        let expression = if expression.starts_with('=') {
            expression.to_string()
        } else {
            format!("={}", expression)
        };
        self.set_value(coord, CellValue::Text(expression))
    }

    /// Clear a cell back to `Empty`
    pub fn clear(&mut self, coord: CellCoord) -> Result<(), GridError> {
        self.set_value(coord, CellValue::Empty)
    }

    /// Toggle the read-only flag. This bypasses the read-only check itself.
    pub fn set_read_only(&mut self, coord: CellCoord, read_only: bool) -> Result<(), GridError> {
        self.get_mut(coord)?.read_only = read_only;
        Ok(())
    }

    /// Overwrite the cached result of a formula cell. Literal cells are left alone.
    pub fn store_computed(&mut self, coord: CellCoord, value: CellValue) -> Result<(), GridError> {
        let cell = self.get_mut(coord)?;
        if cell.is_formula() {
            cell.value = value;
        }
        Ok(())
    }

    /// Replace the entire grid contents
    pub fn replace(&mut self, rows: Vec<Vec<Cell>>) {
        *self = Grid::from_rows(rows);
    }

    /// Append a blank row, returning its index
    pub fn append_row(&mut self) -> u32 {
        self.rows.push(blank_row(self.cols));
        self.row_count() - 1
    }

    /// Insert a blank row before `at` (`at == row_count` appends)
    pub fn insert_row(&mut self, at: u32) -> Result<(), GridError> {
        if at > self.row_count() {
            return Err(GridError::RowIndex {
                index: at,
                len: self.row_count(),
            });
        }
        self.rows.insert(at as usize, blank_row(self.cols));
        Ok(())
    }

    /// Remove a row and return its cells
    pub fn remove_row(&mut self, at: u32) -> Result<Vec<Cell>, GridError> {
        if at >= self.row_count() {
            return Err(GridError::RowIndex {
                index: at,
                len: self.row_count(),
            });
        }
        Ok(self.rows.remove(at as usize))
    }

    /// Append a blank column, returning its index
    pub fn append_column(&mut self) -> u32 {
        for row in &mut self.rows {
            row.push(Cell::default());
        }
        self.cols += 1;
        self.cols - 1
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let cols = self.cols;
        (0..self.row_count()).flat_map(move |row| (0..cols).map(move |col| CellCoord::new(row, col)))
    }

    /// Coordinates of every formula-bearing cell
    pub fn formula_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.coords()
            .filter(|coord| self.cell(*coord).is_some_and(Cell::is_formula))
    }

    fn out_of_range(&self, coord: CellCoord) -> GridError {
        GridError::OutOfRange {
            row: coord.row,
            col: coord.col,
            rows: self.row_count(),
            cols: self.cols,
        }
    }
}

fn needs_tagging(cell: &Cell) -> bool {
    cell.formula.is_none() && matches!(&cell.value, CellValue::Text(s) if is_formula_text(s))
}

fn blank_row(cols: u32) -> Vec<Cell> {
    (0..cols).map(|_| Cell::default()).collect()
}
