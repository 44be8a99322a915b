//! FILENAME: core/report-engine/src/sink.rs
//! PURPOSE: Where rendered rows, cells, merges and outlines are written.
//! CONTEXT: The renderer only talks to `WorkbookSink`; file formats live
//! behind it. `OutputWorkbook` is the in-memory implementation, which the
//! persistence crate can then save as xlsx.

use report_model::{AbsoluteRegion, CellValue, Grid, OutputSheet, OutputWorkbook};

use crate::error::SinkError;

pub trait WorkbookSink {
    /// Starts a new sheet; everything after goes to it.
    fn begin_sheet(&mut self, name: &str) -> Result<(), SinkError>;

    fn create_row(&mut self, row: u32) -> Result<(), SinkError>;

    fn create_cell(&mut self, row: u32, col: u32, style: usize) -> Result<(), SinkError>;

    fn set_cell_value(&mut self, row: u32, col: u32, value: &CellValue) -> Result<(), SinkError>;

    /// `formula` has no leading '='.
    fn set_cell_formula(&mut self, row: u32, col: u32, formula: &str) -> Result<(), SinkError>;

    fn add_merged_region(&mut self, region: &AbsoluteRegion) -> Result<(), SinkError>;

    fn group_rows(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), SinkError>;

    fn set_row_zero_height(&mut self, row: u32) -> Result<(), SinkError>;

    /// Row height in points. Sinks without row sizing ignore it.
    fn set_row_height(&mut self, _row: u32, _height: f64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Grid of the sheet being written.
fn current(book: &mut OutputWorkbook) -> Result<&mut Grid, SinkError> {
    book.sheets.last_mut().map(|s| &mut s.grid).ok_or(SinkError::NoSheet)
}

impl WorkbookSink for OutputWorkbook {
    fn begin_sheet(&mut self, name: &str) -> Result<(), SinkError> {
        self.sheets.push(OutputSheet {
            name: name.to_string(),
            grid: Grid::new(),
        });
        Ok(())
    }

    fn create_row(&mut self, row: u32) -> Result<(), SinkError> {
        current(self)?.create_row(row);
        Ok(())
    }

    fn create_cell(&mut self, row: u32, col: u32, style: usize) -> Result<(), SinkError> {
        current(self)?.cell_mut(row, col).style_index = style;
        Ok(())
    }

    fn set_cell_value(&mut self, row: u32, col: u32, value: &CellValue) -> Result<(), SinkError> {
        let cell = current(self)?.cell_mut(row, col);
        cell.value = value.clone();
        cell.formula = None;
        Ok(())
    }

    fn set_cell_formula(&mut self, row: u32, col: u32, formula: &str) -> Result<(), SinkError> {
        current(self)?.cell_mut(row, col).formula = Some(formula.to_string());
        Ok(())
    }

    fn add_merged_region(&mut self, region: &AbsoluteRegion) -> Result<(), SinkError> {
        current(self)?.add_merged_region(*region);
        Ok(())
    }

    fn group_rows(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), SinkError> {
        current(self)?.group_rows(first, last, collapsed);
        Ok(())
    }

    fn set_row_zero_height(&mut self, row: u32) -> Result<(), SinkError> {
        current(self)?.set_row_zero_height(row);
        Ok(())
    }

    fn set_row_height(&mut self, row: u32, height: f64) -> Result<(), SinkError> {
        current(self)?.set_row_height(row, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_need_a_sheet() {
        let mut book = OutputWorkbook::new();
        assert_eq!(book.create_row(0), Err(SinkError::NoSheet));

        book.begin_sheet("Report").unwrap();
        book.create_cell(1, 1, 3).unwrap();
        book.set_cell_formula(1, 1, "SUM(A1:A2)").unwrap();
        let cell = book.sheets[0].grid.get_cell(1, 1).unwrap();
        assert_eq!(cell.style_index, 3);
        assert_eq!(cell.formula.as_deref(), Some("SUM(A1:A2)"));
    }

    #[test]
    fn test_sheets_are_independent() {
        let mut book = OutputWorkbook::new();
        book.begin_sheet("One").unwrap();
        book.set_cell_value(0, 0, &CellValue::from("a")).unwrap();
        book.begin_sheet("Two").unwrap();
        book.set_row_zero_height(4).unwrap();

        assert_eq!(book.sheet("One").map(|s| s.grid.value(0, 0)), Some(CellValue::from("a")));
        assert!(book.sheet("Two").is_some_and(|s| s.grid.is_row_hidden(4)));
        assert!(book.sheet("Two").is_some_and(|s| s.grid.cells.is_empty()));
    }
}
