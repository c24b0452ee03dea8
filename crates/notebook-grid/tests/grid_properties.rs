//! End-to-end behaviour of the data grid: evaluation, view projection and export.

use notebook_grid::{
    CellCoord, CellError, CellValue, ColumnDef, DataGrid, ErrorDisplay, FreezeMode, Grid,
    GridConfig, SortSpec,
};

fn at(a1: &str) -> CellCoord {
    CellCoord::from_a1(a1).unwrap()
}

fn data_grid(rows: &[&[&str]]) -> DataGrid {
    DataGrid::from_grid(Grid::from_inputs(rows.iter().map(|r| r.iter().copied())))
}

#[test]
fn evaluating_twice_gives_identical_values() {
    let grid = data_grid(&[
        &["1", "=A1*2", "=SUM(A1:B1)"],
        &["=C1/0", "=A2", "=B2&\"!\""],
        &["=C3", "=A3", "=IF(A1>0, \"pos\", \"neg\")"],
    ]);

    assert_eq!(grid.compute(), grid.compute());
}

#[test]
fn changing_a_dependency_updates_the_formula() {
    let mut grid = data_grid(&[&["1", "=SUM(A1:A3)"], &["2", ""], &["3", ""]]);
    assert_eq!(grid.compute().get(at("B1")), Some(&CellValue::Number(6.0)));

    grid.set_input(at("A1"), "5").unwrap();
    assert_eq!(grid.compute().get(at("B1")), Some(&CellValue::Number(10.0)));
}

#[test]
fn formula_chains_resolve_through_other_formulas() {
    let grid = data_grid(&[&["=B1+1", "=C1*2", "4"]]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("A1")), Some(&CellValue::Number(9.0)));
    assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(8.0)));
}

#[test]
fn two_cell_cycle_marks_both_cells() {
    let grid = data_grid(&[&["=B1", "=A1"]]);
    let computed = grid.compute();

    let circular = CellValue::Error(CellError::CircularReference);
    assert_eq!(computed.get(at("A1")), Some(&circular));
    assert_eq!(computed.get(at("B1")), Some(&circular));
    assert_eq!(computed.display(at("A1"), ErrorDisplay::Sentinel), "#CIRCULAR");
}

#[test]
fn long_cycle_terminates() {
    let row: Vec<String> = (0..50)
        .map(|col| {
            let next = CellCoord::new(0, (col + 1) % 50);
            format!("={}", next.to_a1())
        })
        .collect();
    let grid = DataGrid::from_grid(Grid::from_inputs(vec![row]));

    let computed = grid.compute();
    assert!(computed.rows()[0]
        .iter()
        .all(|v| *v == CellValue::Error(CellError::CircularReference)));
}

fn column(cells: impl IntoIterator<Item = String>) -> DataGrid {
    DataGrid::from_grid(Grid::from_inputs(cells.into_iter().map(|cell| vec![cell])))
}

#[test]
fn long_forward_chain_resolves() {
    const ROWS: u32 = 5_000;
    let grid = column((1..=ROWS).map(|row| {
        if row == ROWS {
            "1".to_string()
        } else {
            format!("=A{}+1", row + 1)
        }
    }));

    let computed = grid.compute();
    assert_eq!(computed.get(at("A1")), Some(&CellValue::Number(ROWS as f64)));
    assert_eq!(computed.get(at("A4999")), Some(&CellValue::Number(2.0)));
}

#[test]
fn long_ring_marks_every_cell() {
    const ROWS: u32 = 5_000;
    let grid = column((1..=ROWS).map(|row| format!("=A{}+0", row % ROWS + 1)));

    let computed = grid.compute();
    assert!(computed
        .rows()
        .iter()
        .all(|row| row[0] == CellValue::Error(CellError::CircularReference)));
}

#[test]
fn whole_sheet_ranges_only_read_the_grid() {
    let grid = data_grid(&[
        &["1", "=SUM(A1:A3)+SUM(C1:XFD1048576)"],
        &["2", "=COUNT(A1:A1048576)"],
        &["3", ""],
    ]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(6.0)));
    assert_eq!(computed.get(at("B2")), Some(&CellValue::Number(3.0)));
}

#[test]
fn overflowing_results_sort_after_numbers() {
    let mut grid = column((0..200u32).map(|i| {
        if i % 3 == 0 {
            "=SUM(1E308, 1E308)".to_string()
        } else {
            format!("={} * 1", (i * 7919) % 200)
        }
    }));
    grid.set_sort(Some(SortSpec::ascending(0)));

    let sorted: Vec<CellValue> = grid.projected().into_iter().map(|r| r.values[0].clone()).collect();
    let numbers: Vec<f64> = sorted
        .iter()
        .take_while(|v| !v.is_error())
        .filter_map(CellValue::as_number)
        .collect();

    assert_eq!(numbers.len(), 133);
    assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
    assert!(sorted[133..]
        .iter()
        .all(|v| *v == CellValue::Error(CellError::NumError)));
}

#[test]
fn literal_circular_text_is_not_a_cycle() {
    let grid = data_grid(&[&["#CIRCULAR", "=A1"]]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("B1")), Some(&CellValue::from("#CIRCULAR")));
    assert!(!computed.get(at("B1")).unwrap().is_error());
}

#[test]
fn errors_stay_in_their_cell() {
    let grid = data_grid(&[&["=1/0", "5", "=B1*2", "=A1+1"]]);
    let computed = grid.compute();

    assert_eq!(
        computed.get(at("A1")),
        Some(&CellValue::Error(CellError::DivisionByZero))
    );
    assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(5.0)));
    assert_eq!(computed.get(at("C1")), Some(&CellValue::Number(10.0)));
    // Arithmetic on an error value carries the error forward
    assert_eq!(
        computed.get(at("D1")),
        Some(&CellValue::Error(CellError::DivisionByZero))
    );
    assert_eq!(computed.display(at("D1"), ErrorDisplay::Sentinel), "#ERROR");
}

#[test]
fn malformed_formula_is_contained() {
    let grid = data_grid(&[&["=SUM(", "=NOSUCH(1)", "7"]]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("A1")), Some(&CellValue::Error(CellError::Syntax)));
    assert_eq!(computed.get(at("B1")), Some(&CellValue::Error(CellError::InvalidName)));
    assert_eq!(computed.get(at("C1")), Some(&CellValue::Number(7.0)));
}

#[test]
fn range_aggregation() {
    let grid = data_grid(&[
        &["1", "=SUM(A1:A4)"],
        &["2", "=AVERAGE(A1:A4)"],
        &["3", "=COUNT(A1:A4)"],
        &["4", "=MAX(A1:A4)-MIN(A1:A4)"],
    ]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(10.0)));
    assert_eq!(computed.get(at("B2")), Some(&CellValue::Number(2.5)));
    assert_eq!(computed.get(at("B3")), Some(&CellValue::Number(4.0)));
    assert_eq!(computed.get(at("B4")), Some(&CellValue::Number(3.0)));
}

#[test]
fn references_outside_the_grid_are_blank() {
    let grid = data_grid(&[&["=Z999", "=Z999+2", "=ISBLANK(Z999)"]]);
    let computed = grid.compute();

    assert_eq!(computed.get(at("A1")), Some(&CellValue::Empty));
    assert_eq!(computed.get(at("B1")), Some(&CellValue::Number(2.0)));
    assert_eq!(computed.get(at("C1")), Some(&CellValue::Boolean(true)));
}

#[test]
fn sorting_uses_computed_values() {
    let mut grid = data_grid(&[
        &["10", "20", "=SUM(A1:B1)"],
        &["5", "5", "=SUM(A2:B2)"],
        &["8", "12", "=SUM(A3:B3)"],
    ]);
    grid.set_sort(Some(SortSpec::ascending(2)));

    let totals: Vec<CellValue> = grid.projected().into_iter().map(|r| r.values[2].clone()).collect();
    assert_eq!(
        totals,
        vec![
            CellValue::Number(10.0),
            CellValue::Number(20.0),
            CellValue::Number(30.0)
        ]
    );
}

#[test]
fn frozen_first_row_never_moves() {
    let mut grid = data_grid(&[
        &["Total", "=SUM(B2:B4)"],
        &["c", "3"],
        &["a", "1"],
        &["b", "2"],
    ])
    .with_config(GridConfig {
        freeze: FreezeMode::FirstRow,
        ..Default::default()
    });

    for sort in [SortSpec::ascending(1), SortSpec::descending(1), SortSpec::ascending(0)] {
        grid.set_sort(Some(sort));
        let rows = grid.projected();
        assert_eq!(rows[0].source_row, 0);
        assert_eq!(rows[0].values[1], CellValue::Number(6.0));
    }

    grid.set_filter(0, "a");
    let sources: Vec<u32> = grid.projected().iter().map(|r| r.source_row).collect();
    assert_eq!(sources, vec![0, 2]);
}

#[test]
fn projection_keeps_storage_order() {
    let mut grid = data_grid(&[&["b"], &["a"]]);
    grid.set_sort(Some(SortSpec::ascending(0)));
    let _ = grid.projected();

    assert_eq!(grid.cell(at("A1")).unwrap().value, CellValue::from("b"));
}

#[test]
fn csv_export_quotes_special_values() {
    let grid = data_grid(&[&["Smith, John \"Jr.\"", "=LEN(A1)"]]).with_config(GridConfig {
        export_headers: false,
        ..Default::default()
    });

    let csv = grid.export_csv().unwrap();
    assert_eq!(csv, "\"Smith, John \"\"Jr.\"\"\",17\n");
}

#[test]
fn csv_export_writes_view_with_headers() {
    let mut grid = DataGrid::new(
        Grid::from_inputs(vec![vec!["b", "=1/0"], vec!["a", "=B1"]]),
        vec![ColumnDef::new("name", "Name"), ColumnDef::new("calc", "Calc")],
    );
    grid.set_sort(Some(SortSpec::ascending(0)));

    let csv = grid.export_csv().unwrap();
    assert_eq!(csv, "Name,Calc\na,#ERROR\nb,#ERROR\n");
}

#[test]
fn snapshot_round_trips_raw_cells() {
    let mut grid = data_grid(&[&["1", "=A1+1"]]);
    grid.refresh_cached_values().unwrap();

    let snapshot = grid.snapshot();
    let json = snapshot.to_json().unwrap();
    let restored = notebook_grid::GridSnapshot::from_json(&json).unwrap();
    let (restored_grid, _) = restored.into_grid();

    assert_eq!(restored_grid.get(at("B1")).unwrap().formula.as_deref(), Some("=A1+1"));
    assert_eq!(restored_grid.get(at("B1")).unwrap().value, CellValue::Number(2.0));
}
