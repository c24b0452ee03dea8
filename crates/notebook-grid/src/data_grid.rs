use notebook_core::{Cell, CellCoord, CellValue, ColumnDef, Grid, GridError};
use notebook_formula::EvaluationPass;
use notebook_status::StatusBus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ErrorDisplay, GridConfig};
use crate::export::{export_csv, ExportError};
use crate::save::{GridSnapshot, SaveError, SaveHandler};
use crate::view::{project, FreezeMode, ProjectedRow, SortSpec, ViewState};

/// Result of one evaluation pass: the grid's shape with every formula resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedGrid {
    values: Vec<Vec<CellValue>>,
}

impl ComputedGrid {
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.values
    }

    pub fn row_count(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn col_count(&self) -> u32 {
        self.values.first().map_or(0, |row| row.len() as u32)
    }

    pub fn get(&self, coord: CellCoord) -> Option<&CellValue> {
        self.values
            .get(coord.row as usize)
            .and_then(|row| row.get(coord.col as usize))
    }

    /// Display text of a cell; out-of-range cells render as blank
    pub fn display(&self, coord: CellCoord, mode: ErrorDisplay) -> String {
        self.get(coord).map(|v| mode.render(v)).unwrap_or_default()
    }

    pub fn into_values(self) -> Vec<Vec<CellValue>> {
        self.values
    }
}

/// A data grid: cell storage plus column metadata, view state and an
/// optional status bus.
///
/// Every query recomputes from scratch. Evaluation is
/// O(cells x formula complexity) per call with no incremental invalidation,
/// which is fine for interactive grids of a few hundred rows.
#[derive(Debug, Default)]
pub struct DataGrid {
    grid: Grid,
    columns: Vec<ColumnDef>,
    config: GridConfig,
    view: ViewState,
    status: Option<StatusBus>,
}

impl DataGrid {
    pub fn new(grid: Grid, columns: Vec<ColumnDef>) -> Self {
        Self {
            grid,
            columns,
            ..Default::default()
        }
    }

    /// Grid with spreadsheet-style lettered columns
    pub fn from_grid(grid: Grid) -> Self {
        let columns = (0..grid.col_count()).map(ColumnDef::lettered).collect();
        Self::new(grid, columns)
    }

    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.view.freeze = config.freeze;
        self.config = config;
        self
    }

    pub fn with_status(mut self, status: StatusBus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn cell(&self, coord: CellCoord) -> Result<&Cell, GridError> {
        self.grid.get(coord)
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    fn check_writable(&self, coord: CellCoord) -> Result<(), GridError> {
        if self.config.read_only {
            return Err(GridError::ReadOnly {
                row: coord.row,
                col: coord.col,
            });
        }
        Ok(())
    }

    /// Store typed input; `=...` becomes a formula
    pub fn set_input(&mut self, coord: CellCoord, input: &str) -> Result<(), GridError> {
        self.check_writable(coord)?;
        self.grid.set_input(coord, input)
    }

    pub fn set_value(&mut self, coord: CellCoord, value: CellValue) -> Result<(), GridError> {
        self.check_writable(coord)?;
        self.grid.set_value(coord, value)
    }

    pub fn set_formula(&mut self, coord: CellCoord, expression: &str) -> Result<(), GridError> {
        self.check_writable(coord)?;
        self.grid.set_formula(coord, expression)
    }

    pub fn clear(&mut self, coord: CellCoord) -> Result<(), GridError> {
        self.check_writable(coord)?;
        self.grid.clear(coord)
    }

    /// Replace all data, e.g. when the host supplies a new data set.
    /// Selection is dropped since row identity no longer holds.
    pub fn replace_data(&mut self, rows: Vec<Vec<Cell>>) {
        self.grid.replace(rows);
        self.view.selected_row = None;
        debug!(rows = self.grid.row_count(), cols = self.grid.col_count(), "grid data replaced");
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnDef>) {
        self.columns = columns;
    }

    pub fn append_row(&mut self) -> Result<u32, GridError> {
        self.check_writable(CellCoord::new(self.grid.row_count(), 0))?;
        Ok(self.grid.append_row())
    }

    pub fn insert_row(&mut self, at: u32) -> Result<(), GridError> {
        self.check_writable(CellCoord::new(at, 0))?;
        self.grid.insert_row(at)?;
        if let Some(selected) = self.view.selected_row {
            if selected >= at {
                self.view.selected_row = Some(selected + 1);
            }
        }
        Ok(())
    }

    pub fn remove_row(&mut self, at: u32) -> Result<Vec<Cell>, GridError> {
        self.check_writable(CellCoord::new(at, 0))?;
        let removed = self.grid.remove_row(at)?;
        self.view.selected_row = match self.view.selected_row {
            Some(selected) if selected == at => None,
            Some(selected) if selected > at => Some(selected - 1),
            other => other,
        };
        Ok(removed)
    }

    /// Append a blank column with a lettered definition
    pub fn append_column(&mut self) -> Result<u32, GridError> {
        self.check_writable(CellCoord::new(0, self.grid.col_count()))?;
        let col = self.grid.append_column();
        if self.columns.len() <= col as usize {
            self.columns.push(ColumnDef::lettered(col));
        }
        Ok(col)
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// Evaluate every cell in one fresh pass. Storage is left untouched.
    pub fn compute(&self) -> ComputedGrid {
        let pass = EvaluationPass::new(&self.grid);
        let values = pass.evaluate_all();
        debug_assert!(pass.unfinished().is_empty());

        debug!(
            rows = self.grid.row_count(),
            formulas = self.grid.formula_cells().count(),
            "grid computed"
        );
        ComputedGrid { values }
    }

    /// Write each formula's computed result into its cell's cached value.
    /// Returns how many formula cells were updated.
    pub fn refresh_cached_values(&mut self) -> Result<usize, GridError> {
        let computed = self.compute();
        let formulas: Vec<CellCoord> = self.grid.formula_cells().collect();

        for coord in &formulas {
            let value = computed.get(*coord).cloned().unwrap_or_default();
            self.grid.store_computed(*coord, value)?;
        }
        Ok(formulas.len())
    }

    // -------------------------------------------------------------------------
    // View state
    // -------------------------------------------------------------------------

    pub fn select_row(&mut self, row: Option<u32>) {
        self.view.selected_row = row.filter(|r| *r < self.grid.row_count());
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.view.sort = sort;
    }

    /// Header-click sort cycling on `column`
    pub fn toggle_sort(&mut self, column: u32) -> Option<SortSpec> {
        self.view.sort = SortSpec::toggle(self.view.sort, column);
        self.view.sort
    }

    pub fn set_filter(&mut self, column: u32, needle: impl Into<String>) {
        self.view.set_filter(column, needle);
    }

    pub fn clear_filters(&mut self) {
        self.view.clear_filters();
    }

    pub fn set_freeze(&mut self, freeze: FreezeMode) {
        self.view.freeze = freeze;
    }

    /// Computed rows arranged by the current sort, filters and freeze
    pub fn projected(&self) -> Vec<ProjectedRow> {
        let computed = self.compute();
        project(
            computed.rows(),
            &self.columns,
            &self.view,
            self.config.error_display,
        )
    }

    // -------------------------------------------------------------------------
    // Export and save
    // -------------------------------------------------------------------------

    /// CSV of the current view, computed values only
    pub fn export_csv(&self) -> Result<String, ExportError> {
        let headers = self.config.export_headers.then_some(self.columns.as_slice());
        let csv = export_csv(&self.projected(), headers, self.config.error_display)?;
        info!(bytes = csv.len(), "grid exported to CSV");
        Ok(csv)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::new(&self.grid, &self.columns)
    }

    /// Hand the raw grid to `handler` and report the outcome on the status bus
    pub fn save(&self, handler: &mut impl SaveHandler) -> Result<(), SaveError> {
        let snapshot = self.snapshot();

        match handler.save(&snapshot) {
            Ok(()) => {
                info!(rows = snapshot.row_count(), "grid saved");
                if let Some(status) = &self.status {
                    status.success(format!("Saved {} rows", snapshot.row_count()));
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "grid save failed");
                if let Some(status) = &self.status {
                    status.error(format!("Save failed: {}", err));
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_core::CellError;

    fn at(a1: &str) -> CellCoord {
        CellCoord::from_a1(a1).unwrap()
    }

    fn sheet(rows: &[&[&str]]) -> DataGrid {
        DataGrid::from_grid(Grid::from_inputs(rows.iter().map(|r| r.iter().copied())))
    }

    #[test]
    fn test_compute_leaves_storage_untouched() {
        let grid = sheet(&[&["2", "=A1*3"]]);
        let computed = grid.compute();

        assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(6.0)));
        assert_eq!(grid.cell(at("B1")).unwrap().value, CellValue::Empty);
    }

    #[test]
    fn test_refresh_cached_values() {
        let mut grid = sheet(&[&["2", "=A1*3", "=1/0"]]);
        assert_eq!(grid.refresh_cached_values().unwrap(), 2);

        assert_eq!(grid.cell(at("B1")).unwrap().value, CellValue::Number(6.0));
        assert_eq!(
            grid.cell(at("C1")).unwrap().value,
            CellValue::Error(CellError::DivisionByZero)
        );
        assert_eq!(grid.cell(at("A1")).unwrap().value, CellValue::Number(2.0));
    }

    #[test]
    fn test_edit_then_recompute() {
        let mut grid = sheet(&[&["1", "=A1+1"]]);
        grid.set_input(at("A1"), "41").unwrap();
        assert_eq!(grid.compute().get(at("B1")), Some(&CellValue::Number(42.0)));

        grid.set_input(at("B1"), "plain").unwrap();
        assert!(!grid.cell(at("B1")).unwrap().is_formula());
    }

    #[test]
    fn test_out_of_range_edit_fails() {
        let mut grid = sheet(&[&["1"]]);
        assert!(matches!(
            grid.set_input(at("C5"), "x"),
            Err(GridError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_read_only_config_blocks_edits() {
        let mut grid = sheet(&[&["1"]]).with_config(GridConfig {
            read_only: true,
            ..Default::default()
        });

        assert!(matches!(
            grid.set_input(at("A1"), "2"),
            Err(GridError::ReadOnly { .. })
        ));
        assert!(grid.append_row().is_err());
    }

    #[test]
    fn test_row_operations_track_selection() {
        let mut grid = sheet(&[&["a"], &["b"], &["c"]]);
        grid.select_row(Some(2));

        grid.insert_row(0).unwrap();
        assert_eq!(grid.view().selected_row, Some(3));

        grid.remove_row(1).unwrap();
        assert_eq!(grid.view().selected_row, Some(2));

        grid.remove_row(2).unwrap();
        assert_eq!(grid.view().selected_row, None);
        assert_eq!(grid.grid().row_count(), 2);
    }

    #[test]
    fn test_append_column_adds_definition() {
        let mut grid = sheet(&[&["a"]]);
        assert_eq!(grid.append_column().unwrap(), 1);
        assert_eq!(grid.columns()[1].header, "B");
    }

    #[test]
    fn test_save_reports_status() {
        let bus = StatusBus::new();
        let grid = sheet(&[&["1", "=A1"]]).with_status(bus.clone());

        let mut saved = Vec::new();
        grid.save(&mut |snapshot: &GridSnapshot| -> Result<(), SaveError> {
            saved.push(snapshot.clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].rows[0][1].formula.as_deref(), Some("=A1"));
        assert_eq!(bus.current().map(|m| m.text), Some("Saved 1 rows".to_string()));

        let result = grid.save(&mut |_: &GridSnapshot| -> Result<(), SaveError> {
            Err(SaveError::Rejected("disk full".into()))
        });
        assert!(result.is_err());
        let current = bus.current().unwrap();
        assert_eq!(current.level, notebook_status::StatusLevel::Error);
        assert!(current.text.contains("disk full"));
    }

    #[test]
    fn test_toggle_sort() {
        let mut grid = sheet(&[&["b"], &["a"]]);
        assert_eq!(grid.toggle_sort(0), Some(SortSpec::ascending(0)));
        let sources: Vec<u32> = grid.projected().iter().map(|r| r.source_row).collect();
        assert_eq!(sources, vec![1, 0]);
    }
}
