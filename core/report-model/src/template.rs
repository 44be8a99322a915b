//! FILENAME: core/report-model/src/template.rs
//! PURPOSE: Cell and row templates stamped into the output by an Area.

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// What a template cell produces when stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellContent {
    /// Styled but valueless cell.
    #[default]
    Empty,
    /// Fixed value, written as-is.
    Literal(CellValue),
    /// Data-bound expression handed to the cell evaluator.
    Expression(String),
}

/// A single template cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CellTemplate {
    pub content: CellContent,
    /// Index into the report's style registry.
    #[serde(default)]
    pub style: usize,
}

impl CellTemplate {
    pub fn literal(value: impl Into<CellValue>) -> Self {
        CellTemplate {
            content: CellContent::Literal(value.into()),
            style: 0,
        }
    }

    pub fn expression(expr: impl Into<String>) -> Self {
        CellTemplate {
            content: CellContent::Expression(expr.into()),
            style: 0,
        }
    }

    pub fn with_style(mut self, style: usize) -> Self {
        self.style = style;
        self
    }
}

/// One template row: a sparse list of cells (None = no cell at that column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RowTemplate {
    pub cells: Vec<Option<CellTemplate>>,
    /// Row height in points; None keeps the sheet default.
    #[serde(default)]
    pub height: Option<f64>,
}

impl RowTemplate {
    pub fn new(cells: Vec<Option<CellTemplate>>) -> Self {
        RowTemplate { cells, height: None }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Highest populated column + 1 (0 for an empty row).
    pub fn populated_width(&self) -> u32 {
        self.cells
            .iter()
            .rposition(Option::is_some)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    pub fn cell(&self, col: u32) -> Option<&CellTemplate> {
        self.cells.get(col as usize).and_then(Option::as_ref)
    }
}
