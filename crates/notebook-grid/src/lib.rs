//! Data grid driver for notebook-ui.
//!
//! [`DataGrid`] owns the cell store and recomputes it in a fresh
//! [`notebook_formula::EvaluationPass`] on every query. Sorting, filtering
//! and frozen rows are applied afterwards by [`view::project`], and the
//! resulting view can be exported as CSV or the raw grid handed to a
//! [`SaveHandler`].

pub mod config;
pub mod data_grid;
pub mod export;
pub mod save;
pub mod view;

pub use config::{ErrorDisplay, GridConfig, GridConfigError};
pub use data_grid::{ComputedGrid, DataGrid};
pub use export::{export_csv, ExportError};
pub use save::{GridSnapshot, JsonSaveHandler, SaveError, SaveHandler};
pub use view::{project, FreezeMode, ProjectedRow, SortDirection, SortSpec, ViewState};

pub use notebook_core::{Cell, CellCoord, CellError, CellValue, ColumnDef, ColumnType, Grid, GridError};
pub use notebook_status::{StatusBus, StatusLevel, StatusMessage, Subscription};
