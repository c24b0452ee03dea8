//! Sort, filter and freeze over computed values.
//!
//! The projection never touches storage: it takes the evaluated grid and
//! returns rows in display order, each tagged with the storage row it came
//! from. Frozen rows are pulled out first and stay on top in their original
//! order; only the remaining rows are filtered and sorted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use notebook_core::{CellValue, ColumnDef};
use serde::{Deserialize, Serialize};

use crate::config::ErrorDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: u32,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: u32) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: u32) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// Next sort after clicking `column`: none, ascending, descending, none.
    /// Clicking a different column starts over at ascending.
    pub fn toggle(current: Option<SortSpec>, column: u32) -> Option<SortSpec> {
        match current {
            Some(spec) if spec.column == column => match spec.direction {
                SortDirection::Ascending => Some(SortSpec::descending(column)),
                SortDirection::Descending => None,
            },
            _ => Some(SortSpec::ascending(column)),
        }
    }

    fn compare(&self, a: &[CellValue], b: &[CellValue]) -> Ordering {
        let col = self.column as usize;
        let empty = CellValue::Empty;
        let ordering = a
            .get(col)
            .unwrap_or(&empty)
            .sort_cmp(b.get(col).unwrap_or(&empty));

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Which rows stay pinned at the top of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FreezeMode {
    #[default]
    None,
    /// The first `n` rows
    Count(u32),
    FirstRow,
    /// Whatever row is selected; nothing when there is no selection
    SelectedRow,
}

impl FreezeMode {
    /// Frozen storage rows in display order
    pub fn frozen_rows(&self, row_count: u32, selected: Option<u32>) -> Vec<u32> {
        match *self {
            FreezeMode::None => vec![],
            FreezeMode::Count(n) => (0..n.min(row_count)).collect(),
            FreezeMode::FirstRow => (0..1.min(row_count)).collect(),
            FreezeMode::SelectedRow => selected.filter(|row| *row < row_count).into_iter().collect(),
        }
    }
}

/// Everything the projection needs besides the values themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub sort: Option<SortSpec>,
    /// Column index to case-insensitive needle
    pub filters: BTreeMap<u32, String>,
    pub freeze: FreezeMode,
    pub selected_row: Option<u32>,
}

impl ViewState {
    /// Set or clear (blank `needle`) the filter on `column`
    pub fn set_filter(&mut self, column: u32, needle: impl Into<String>) {
        let needle = needle.into();
        if needle.trim().is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, needle);
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }
}

/// One display row and the storage row it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedRow {
    pub source_row: u32,
    pub values: Vec<CellValue>,
}

/// Arrange computed `values` for display.
///
/// `columns` gate which columns may be sorted or filtered; a column without
/// a definition allows both. Filter needles match against the text `display`
/// renders for each value.
pub fn project(
    values: &[Vec<CellValue>],
    columns: &[ColumnDef],
    view: &ViewState,
    display: ErrorDisplay,
) -> Vec<ProjectedRow> {
    let row_count = values.len() as u32;
    let frozen = view.freeze.frozen_rows(row_count, view.selected_row);

    let filters: Vec<(usize, String)> = view
        .filters
        .iter()
        .filter(|(col, needle)| {
            !needle.trim().is_empty()
                && columns.get(**col as usize).map_or(true, |c| c.filterable)
        })
        .map(|(col, needle)| (*col as usize, needle.to_lowercase()))
        .collect();

    let mut rest: Vec<u32> = (0..row_count)
        .filter(|row| !frozen.contains(row))
        .filter(|row| {
            let cells = &values[*row as usize];
            filters.iter().all(|(col, needle)| {
                let text = cells.get(*col).map(|v| display.render(v)).unwrap_or_default();
                text.to_lowercase().contains(needle.as_str())
            })
        })
        .collect();

    let sort = view
        .sort
        .filter(|spec| columns.get(spec.column as usize).map_or(true, |c| c.sortable));
    if let Some(spec) = sort {
        rest.sort_by(|a, b| spec.compare(&values[*a as usize], &values[*b as usize]));
    }

    frozen
        .into_iter()
        .chain(rest)
        .map(|row| ProjectedRow {
            source_row: row,
            values: values[row as usize].clone(),
        })
        .collect()
}
