//! FILENAME: core/report-engine/src/render.rs
//! PURPOSE: Stamps areas into the sheet and owns the output row cursor.
//! CONTEXT: `SheetWriter` is the only place that advances the output row and
//! the only place that enforces the sheet row limit. Rows are created when
//! they are reserved; stamping an area then fills reserved rows with cells,
//! row sizes and merged regions.

use report_model::{Area, CellContent, Record, RenderSettings};

use crate::context::{RenderHistory, SectionContext};
use crate::error::RenderError;
use crate::eval::{CellEvaluator, Evaluated};
use crate::group::Group;
use crate::logging::{log_debug, AREA};
use crate::macros::{MacroContext, MacroDispatcher};
use crate::sink::WorkbookSink;

/// What the cells of one stamped area are evaluated against.
pub struct StampScope<'a> {
    pub record: &'a Record,
    /// Enclosing records, outermost first.
    pub scopes: &'a [Record],
    pub history: &'a RenderHistory,
    pub section: Option<&'a SectionContext<'a>>,
    pub group: Option<&'a Group<'a>>,
}

pub struct SheetWriter<'r> {
    sink: &'r mut dyn WorkbookSink,
    evaluator: &'r dyn CellEvaluator,
    macros: MacroDispatcher<'r>,
    params: &'r Record,
    max_rows: u32,
    row: u32,
}

impl<'r> SheetWriter<'r> {
    pub fn new(
        sink: &'r mut dyn WorkbookSink,
        evaluator: &'r dyn CellEvaluator,
        macros: MacroDispatcher<'r>,
        params: &'r Record,
        settings: &RenderSettings,
    ) -> Self {
        SheetWriter {
            sink,
            evaluator,
            macros,
            params,
            max_rows: settings.max_rows,
            row: settings.first_row,
        }
    }

    pub fn current_row(&self) -> u32 {
        self.row
    }

    /// Creates `count` blank rows at the cursor and moves past them.
    pub fn reserve_rows(&mut self, count: u32) -> Result<u32, RenderError> {
        let first = self.row;
        let end = first
            .checked_add(count)
            .filter(|&end| end <= self.max_rows)
            .ok_or(RenderError::RowLimit {
                row: first,
                requested: count,
                max_rows: self.max_rows,
            })?;
        for row in first..end {
            self.sink.create_row(row)?;
        }
        self.row = end;
        Ok(first)
    }

    /// Reserves the area's rows at the cursor and stamps it there.
    pub fn write_area(&mut self, area: &Area, scope: &StampScope<'_>) -> Result<u32, RenderError> {
        let row = self.reserve_rows(area.row_count())?;
        self.stamp(area, row, scope)?;
        Ok(row)
    }

    /// Fills already reserved rows starting at `row` with `area`.
    pub fn stamp(&mut self, area: &Area, row: u32, scope: &StampScope<'_>) -> Result<(), RenderError> {
        log_debug!(AREA, "stamp {}x{} at row {}", area.column_count(), area.row_count(), row);

        for (offset, template) in area.rows().iter().enumerate() {
            let out_row = row + offset as u32;

            if let Some(height) = template.height {
                self.sink.set_row_height(out_row, height)?;
            }

            for (col, cell) in template.cells.iter().enumerate() {
                let Some(cell) = cell else { continue };
                let col = col as u32;
                self.sink.create_cell(out_row, col, cell.style)?;

                match &cell.content {
                    CellContent::Empty => {}
                    CellContent::Literal(value) => self.sink.set_cell_value(out_row, col, value)?,
                    CellContent::Expression(expr) => {
                        match self.evaluator.evaluate(expr, scope.record, scope.scopes)? {
                            Evaluated::Value(value) => self.sink.set_cell_value(out_row, col, &value)?,
                            Evaluated::Formula(formula) => self.sink.set_cell_formula(out_row, col, &formula)?,
                            Evaluated::Macro { name, args } => {
                                let ctx = MacroContext {
                                    row: out_row,
                                    col,
                                    section: scope.section,
                                    history: scope.history,
                                    params: self.params,
                                    group: scope.group,
                                };
                                let formula = self.macros.invoke(&name, &args, &ctx)?;
                                self.sink.set_cell_formula(out_row, col, &formula)?;
                            }
                        }
                    }
                }
            }

            if area.is_hidden() {
                self.sink.set_row_zero_height(out_row)?;
            }
        }

        for region in area.make_output_regions(row)? {
            self.sink.add_merged_region(&region)?;
        }
        Ok(())
    }

    /// Outlines `first..=last`; collapsed outlines get zero-height rows.
    pub fn outline(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), RenderError> {
        self.sink.group_rows(first, last, collapsed)?;
        if collapsed {
            for row in first..=last {
                self.sink.set_row_zero_height(row)?;
            }
        }
        Ok(())
    }
}
