pub mod cell;
pub mod column;
pub mod error;
pub mod grid;
pub mod range;

pub use cell::{is_formula_text, parse_cell_input, Cell, CellValue};
pub use column::{ColumnDef, ColumnType};
pub use error::{CellError, GridError, CIRCULAR_SENTINEL, ERROR_SENTINEL};
pub use grid::Grid;
pub use range::{col_from_label, col_to_label, CellCoord, CellRange};
