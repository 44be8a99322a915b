//! FILENAME: core/report-model/src/grid.rs
//! PURPOSE: The rendered output: sheets of cells, merges, outlines and row sizes.
//! CONTEXT: `Grid` uses a sparse storage strategy (HashMap) so long reports
//! with mostly empty columns stay cheap. Row and Col are 0-based indices.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::region::AbsoluteRegion;
use crate::value::CellValue;

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputCell {
    pub value: CellValue,
    /// Formula text without the leading '='; the value is then a cached result.
    pub formula: Option<String>,
    pub style_index: usize,
}

impl OutputCell {
    pub fn new(value: CellValue) -> Self {
        OutputCell {
            value,
            formula: None,
            style_index: 0,
        }
    }

    pub fn with_style(mut self, style_index: usize) -> Self {
        self.style_index = style_index;
        self
    }
}

/// An outlined block of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowGroup {
    pub first_row: u32,
    pub last_row: u32,
    pub collapsed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    /// Sparse storage: keys are (row, col).
    pub cells: HashMap<(u32, u32), OutputCell>,

    /// Highest row index currently in use.
    pub max_row: u32,

    /// Highest column index currently in use.
    pub max_col: u32,

    /// Rows explicitly created, including ones that never receive a cell.
    pub rows: BTreeSet<u32>,

    pub merged: Vec<AbsoluteRegion>,

    /// Outline groups in the order they were requested (innermost closes first).
    pub row_groups: Vec<RowGroup>,

    /// Rows rendered with zero height.
    pub hidden_rows: BTreeSet<u32>,

    /// Explicit row heights in points.
    pub row_heights: BTreeMap<u32, f64>,
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    fn touch(&mut self, row: u32, col: u32) {
        if row > self.max_row {
            self.max_row = row;
        }
        if col > self.max_col {
            self.max_col = col;
        }
    }

    pub fn create_row(&mut self, row: u32) {
        if row > self.max_row {
            self.max_row = row;
        }
        self.rows.insert(row);
    }

    /// Sets a cell, updating max_row/max_col automatically.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: OutputCell) {
        self.touch(row, col);
        self.rows.insert(row);
        self.cells.insert((row, col), cell);
    }

    /// Returns the cell at (row, col), creating an empty one first if needed.
    pub fn cell_mut(&mut self, row: u32, col: u32) -> &mut OutputCell {
        self.touch(row, col);
        self.rows.insert(row);
        self.cells.entry((row, col)).or_default()
    }

    pub fn get_cell(&self, row: u32, col: u32) -> Option<&OutputCell> {
        self.cells.get(&(row, col))
    }

    /// Value at (row, col), Empty when the cell is absent.
    pub fn value(&self, row: u32, col: u32) -> CellValue {
        self.get_cell(row, col).map(|c| c.value.clone()).unwrap_or_default()
    }

    pub fn add_merged_region(&mut self, region: AbsoluteRegion) {
        self.touch(region.last_row, region.last_col);
        self.merged.push(region);
    }

    pub fn group_rows(&mut self, first_row: u32, last_row: u32, collapsed: bool) {
        self.row_groups.push(RowGroup {
            first_row,
            last_row,
            collapsed,
        });
    }

    pub fn set_row_zero_height(&mut self, row: u32) {
        self.hidden_rows.insert(row);
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }

    /// Values of `row` from column 0 up to the last used column.
    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        let last = self
            .cells
            .keys()
            .filter(|(r, _)| *r == row)
            .map(|(_, c)| *c)
            .max();
        match last {
            Some(last) => (0..=last).map(|col| self.value(row, col)).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSheet {
    pub name: String,
    pub grid: Grid,
}

/// All sheets produced by one render, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputWorkbook {
    pub sheets: Vec<OutputSheet>,
}

impl OutputWorkbook {
    pub fn new() -> Self {
        OutputWorkbook::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&OutputSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
