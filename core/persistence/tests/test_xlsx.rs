//! FILENAME: core/persistence/tests/test_xlsx.rs
//! Saving rendered reports to xlsx and reading xlsx sheets back.

use persistence::{load_xlsx, render_to_xlsx, save_xlsx, save_xlsx_to_buffer, ExportError, XlsxProvider};
use report_engine::{DataError, DataSource, DataSourceProvider, RenderError};
use report_model::{
    Area, CellStyle, CellTemplate, CellValue, Color, GroupModel, OutputWorkbook, Record, ReportModel,
    SectionModel, SheetModel, StyleRegistry,
};
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// FIXTURES
// ============================================================================

fn expr(e: &str) -> Option<CellTemplate> {
    Some(CellTemplate::expression(e))
}

/// Writes `sheets` (header row then data rows) as an xlsx data file.
fn write_data_file(path: &Path, sheets: &[(&str, Vec<Vec<CellValue>>)]) {
    let mut book = OutputWorkbook::new();
    for (name, rows) in sheets {
        use report_engine::WorkbookSink;
        book.begin_sheet(name).unwrap();
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                book.set_cell_value(row as u32, col as u32, value).unwrap();
            }
        }
    }
    save_xlsx(&book, &StyleRegistry::new(), path).unwrap();
}

fn orders_file(path: &Path) {
    write_data_file(
        path,
        &[
            (
                "orders",
                vec![
                    vec!["order_id".into(), "customer".into()],
                    vec![1.into(), "Acme".into()],
                    vec![2.into(), "Beta".into()],
                ],
            ),
            (
                "lines",
                vec![
                    vec!["order_id".into(), "sku".into(), "amount".into()],
                    vec![1.into(), "x".into(), 5.into()],
                    vec![2.into(), "z".into(), 7.into()],
                    vec![1.into(), "y".into(), 6.into()],
                ],
            ),
        ],
    );
}

fn region_report() -> ReportModel {
    let mut styles = StyleRegistry::new();
    let bold = styles.get_or_create(
        CellStyle::new()
            .with_bold(true)
            .with_background(Color::new(0xDD, 0xEE, 0xFF)),
    );
    let header = Area::from_cells(vec![vec![
        Some(CellTemplate::expression("region").with_style(bold)),
        None,
        Some(CellTemplate::expression("#GROUP_SUM(C)").with_style(bold)),
    ]])
    .with_region(0, 0, 1, 0)
    .unwrap();
    let record = Area::from_cells(vec![vec![expr("product"), expr("qty"), expr("amount")]]);

    let mut model = ReportModel::new("Sales").with_sheet(SheetModel::new(
        "Report",
        vec![SectionModel::grouping(
            "lines",
            vec![GroupModel::new("region", header).with_outline(true, true)],
            record,
        )
        .with_source("orders")],
    ));
    model.styles = styles;
    model
}

fn region_data(path: &Path) {
    write_data_file(
        path,
        &[(
            "orders",
            vec![
                vec!["region".into(), "product".into(), "qty".into(), "amount".into()],
                vec!["North".into(), "apples".into(), 1.into(), 10.into()],
                vec!["North".into(), "pears".into(), 2.into(), 20.into()],
                vec!["South".into(), "plums".into(), 3.into(), 30.into()],
            ],
        )],
    );
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_render_to_xlsx_and_read_back() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.xlsx");
    let out = dir.path().join("report.xlsx");
    region_data(&data);

    let mut provider = XlsxProvider::from_path(&data).unwrap();
    let summary = render_to_xlsx(&region_report(), &Record::new(), &mut provider, &out).unwrap();
    assert_eq!(summary.sheets[0].end_row, 5);

    let book = load_xlsx(&out).unwrap();
    let grid = &book.sheet("Report").unwrap().grid;
    assert_eq!(grid.value(0, 0), CellValue::from("North"));
    assert_eq!(grid.value(1, 0), CellValue::from("apples"));
    assert_eq!(grid.value(2, 2), CellValue::Number(20.0));
    assert_eq!(grid.value(3, 0), CellValue::from("South"));
    assert_eq!(grid.get_cell(0, 2).and_then(|c| c.formula.as_deref()), Some("SUM(C2:C3)"));
    assert_eq!(grid.get_cell(3, 2).and_then(|c| c.formula.as_deref()), Some("SUM(C5)"));
}

#[test]
fn test_provider_reads_header_row_as_fields() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.xlsx");
    orders_file(&data);

    let mut provider = XlsxProvider::from_path(&data).unwrap();
    let mut source = provider.open("orders", &[]).unwrap();

    assert_eq!(
        source.read_ahead().unwrap().and_then(|r| r.get("customer")).cloned(),
        Some(CellValue::from("Acme"))
    );
    let first = source.next_record().unwrap();
    assert_eq!(first.get("order_id"), Some(&CellValue::Number(1.0)));
    assert!(source.has_next().unwrap());
    let second = source.next_record().unwrap();
    assert_eq!(second.get("customer"), Some(&CellValue::from("Beta")));
    assert!(!source.has_next().unwrap());
    assert_eq!(source.next_record(), Err(DataError::Exhausted("orders".to_string())));
    source.close().unwrap();
}

#[test]
fn test_linked_detail_sheet_follows_the_master_record() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.xlsx");
    let out = dir.path().join("orders.xlsx");
    orders_file(&data);

    let head = SectionModel::plain("head", Area::from_cells(vec![vec![expr("customer")]]));
    let lines = SectionModel::plain("lines", Area::from_cells(vec![vec![expr("sku"), expr("amount")]]))
        .with_source("lines")
        .with_order(1);
    let model = ReportModel::new("Orders").with_sheet(SheetModel::new(
        "Orders",
        vec![SectionModel::composite("orders", Vec::new(), vec![head, lines]).with_source("orders")],
    ));

    let mut provider = XlsxProvider::from_path(&data)
        .unwrap()
        .with_link("lines", "order_id", "order_id");
    let summary = render_to_xlsx(&model, &Record::new(), &mut provider, &out).unwrap();
    assert_eq!(summary.history.runs("lines").len(), 2);

    let book = load_xlsx(&out).unwrap();
    let grid = &book.sheets[0].grid;
    let column: Vec<CellValue> = (0..5).map(|row| grid.value(row, 0)).collect();
    assert_eq!(
        column,
        vec![
            CellValue::from("Acme"),
            CellValue::from("x"),
            CellValue::from("y"),
            CellValue::from("Beta"),
            CellValue::from("z"),
        ]
    );
}

#[test]
fn test_missing_sheet_is_an_unknown_source() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.xlsx");
    orders_file(&data);

    let mut provider = XlsxProvider::from_path(&data).unwrap();
    assert!(matches!(
        provider.open("customers", &[]),
        Err(DataError::UnknownSource(name)) if name == "customers"
    ));
}

#[test]
fn test_failed_render_writes_no_file() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.xlsx");
    let out = dir.path().join("report.xlsx");
    orders_file(&data);

    let model = ReportModel::new("Broken").with_sheet(SheetModel::new(
        "Broken",
        vec![SectionModel::plain("x", Area::from_cells(vec![vec![expr("colour")]])).with_source("orders")],
    ));
    let mut provider = XlsxProvider::from_path(&data).unwrap();
    let err = render_to_xlsx(&model, &Record::new(), &mut provider, &out).unwrap_err();
    assert!(matches!(err, ExportError::Render(RenderError::Eval(_))));
    assert!(!out.exists());
}

#[test]
fn test_styles_merges_and_outlines_encode() {
    let mut book = OutputWorkbook::new();
    {
        use report_engine::WorkbookSink;
        book.begin_sheet("Styled").unwrap();
        book.create_cell(0, 0, 1).unwrap();
        book.set_cell_value(0, 0, &CellValue::from("Title")).unwrap();
        book.add_merged_region(&report_model::AbsoluteRegion {
            first_row: 0,
            first_col: 0,
            last_row: 0,
            last_col: 3,
        })
        .unwrap();
        for row in 1..6 {
            book.set_cell_value(row, 0, &CellValue::Number(row as f64)).unwrap();
        }
        book.group_rows(2, 3, true).unwrap();
        book.group_rows(1, 5, false).unwrap();
        book.set_row_zero_height(2).unwrap();
        book.set_row_zero_height(3).unwrap();
        book.set_row_height(0, 24.0).unwrap();
    }

    let mut styles = StyleRegistry::new();
    styles.get_or_create(CellStyle::new().with_bold(true).with_number_format("0.00"));

    let bytes = save_xlsx_to_buffer(&book, &styles).unwrap();
    assert!(bytes.starts_with(b"PK"));
}
