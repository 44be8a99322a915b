//! FILENAME: core/report-model/tests/test_region_model.rs
//! Integration tests for Area geometry under long runs of row/column edits.

use proptest::prelude::*;
use report_model::{Area, CellTemplate, ModelError, Region, RowTemplate};

fn filled(rows: u32, cols: u32) -> Area {
    Area::from_cells(
        (0..rows)
            .map(|r| (0..cols).map(|c| Some(CellTemplate::literal(format!("{}:{}", r, c)))).collect())
            .collect(),
    )
}

/// `filled(rows, cols)` with up to five regions inside it.
fn area_with_regions(rows: u32, cols: u32) -> impl Strategy<Value = Area> {
    prop::collection::vec((0..cols, 0..cols, 0..rows, 0..rows), 0..=5).prop_map(move |corners| {
        let mut area = filled(rows, cols);
        for (c0, c1, r0, r1) in corners {
            area.add_region(c0.min(c1), r0.min(r1), c0.max(c1), r0.max(r1))
                .expect("corners lie inside the area");
        }
        area
    })
}

/// One row or column edit. Positions are reduced modulo the area's size
/// when applied, since earlier edits change it.
#[derive(Debug, Clone)]
enum Edit {
    RemoveRow(u32),
    RemoveColumn(u32),
    AddRow { at: u32, width: u32 },
    AddColumn(u32),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        any::<u32>().prop_map(Edit::RemoveRow),
        any::<u32>().prop_map(Edit::RemoveColumn),
        (any::<u32>(), any::<u32>()).prop_map(|(at, width)| Edit::AddRow { at, width }),
        any::<u32>().prop_map(Edit::AddColumn),
    ]
}

fn apply(area: &mut Area, edit: &Edit) -> Result<(), ModelError> {
    let rows = area.row_count();
    let cols = area.column_count();
    match *edit {
        Edit::RemoveRow(at) if rows > 1 => area.remove_row(at % rows).map(|_| ()),
        Edit::RemoveColumn(at) if cols > 1 => area.remove_column(at % cols).map(|_| ()),
        Edit::AddRow { at, width } => {
            let cells = (0..width % (cols + 2)).map(|_| Some(CellTemplate::literal("n"))).collect::<Vec<_>>();
            area.add_row(at % (rows + 1), cells)
        }
        Edit::AddColumn(at) => area.add_column(at % (cols + 1), vec![None; rows as usize]),
        // never empty the area from a random sequence
        Edit::RemoveRow(_) | Edit::RemoveColumn(_) => Ok(()),
    }
}

// ============================================================================
// RANDOMIZED EDIT SEQUENCES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_regions_stay_valid_under_random_edits(
        mut area in area_with_regions(6, 6),
        edits in prop::collection::vec(edit(), 0..60),
    ) {
        for (step, edit) in edits.iter().enumerate() {
            let result = apply(&mut area, edit);
            prop_assert!(result.is_ok(), "step {} {:?}: {:?}", step, edit, result);
            prop_assert!(
                area.check_regions().is_ok(),
                "step {} {:?}: {:?}",
                step,
                edit,
                area.regions()
            );
        }
    }

    #[test]
    fn test_add_remove_row_round_trip(original in area_with_regions(5, 4), at in 0u32..=5) {
        let mut area = original.clone();
        area.add_row(at, RowTemplate::default()).unwrap();
        area.remove_row(at).unwrap();
        prop_assert_eq!(area.regions(), original.regions());
        prop_assert_eq!(area.row_count(), original.row_count());
    }

    #[test]
    fn test_add_remove_column_round_trip(original in area_with_regions(4, 5), at in 0u32..=5) {
        let mut area = original.clone();
        area.add_column(at, vec![None; original.row_count() as usize]).unwrap();
        area.remove_column(at).unwrap();
        prop_assert_eq!(area.regions(), original.regions());
        prop_assert_eq!(area.rows(), original.rows());
    }
}

// ============================================================================
// EDGE CASES
// ============================================================================

#[test]
fn test_removing_every_row_drops_every_region() {
    let mut area = filled(3, 3).with_region(0, 0, 2, 2).unwrap();
    for _ in 0..3 {
        area.remove_row(0).unwrap();
    }
    assert_eq!(area.row_count(), 0);
    assert!(area.regions().is_empty());
    assert_eq!(
        area.remove_row(0),
        Err(ModelError::RowOutOfRange { row: 0, row_count: 0 })
    );
}

#[test]
fn test_removing_every_column_drops_every_region() {
    let mut area = filled(2, 3).with_region(0, 0, 2, 1).unwrap();
    for _ in 0..3 {
        area.remove_column(0).unwrap();
    }
    assert_eq!(area.column_count(), 0);
    assert!(area.regions().is_empty());
}

#[test]
fn test_region_inside_row_removal_shrinks() {
    let mut area = filled(4, 2).with_region(0, 1, 1, 3).unwrap();
    area.remove_row(2).unwrap();
    assert_eq!(
        area.regions(),
        &[Region { first_col: 0, first_row: 1, last_col: 1, last_row: 2 }]
    );
}
