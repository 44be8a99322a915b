//! FILENAME: core/report-model/src/area.rs
//! Area - a rectangular block of template rows with its merged regions.
//!
//! An Area is the unit a section stamps into the output: rows of sparse cell
//! templates plus the merged-cell rectangles laid over them. Regions are kept
//! template-relative and are re-based on the output row only at render time
//! (`make_output_regions`).
//!
//! Geometry invariant, checked on construction and preserved by every mutation:
//! `first_col <= last_col < column_count` and `first_row <= last_row < row_count`
//! for every region. Inserting or removing a row/column shifts, stretches,
//! shrinks or drops regions so the invariant holds after each single step; a
//! region that would collapse to zero width/height is removed, never kept.
//!
//! `column_count` is the width of the area. It starts as the highest populated
//! column + 1 across rows, then follows the column operations; removing a row
//! never narrows the area, so regions on surviving rows stay in bounds.

use serde::{Deserialize, Serialize};

use crate::coord::MAX_SHEET_ROWS;
use crate::error::ModelError;
use crate::region::{AbsoluteRegion, Region};
use crate::template::{CellTemplate, RowTemplate};

/// Serialized shape of an Area. Converting it validates the regions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub rows: Vec<RowTemplate>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "AreaDefinition", into = "AreaDefinition")]
pub struct Area {
    rows: Vec<RowTemplate>,
    column_count: u32,
    regions: Vec<Region>,
    hidden: bool,
}

impl Area {
    /// Builds an area from row templates. Trailing empty slots are dropped so
    /// the width is the highest populated column + 1.
    pub fn new(mut rows: Vec<RowTemplate>) -> Self {
        let column_count = rows.iter().map(RowTemplate::populated_width).max().unwrap_or(0);
        for row in &mut rows {
            row.cells.truncate(column_count as usize);
        }
        Area {
            rows,
            column_count,
            regions: Vec::new(),
            hidden: false,
        }
    }

    /// Shorthand for building from bare cell lists.
    pub fn from_cells(rows: Vec<Vec<Option<CellTemplate>>>) -> Self {
        Area::new(rows.into_iter().map(RowTemplate::new).collect())
    }

    /// An area of `row_count` rows without any cells.
    pub fn blank(row_count: u32) -> Self {
        Area::new((0..row_count).map(|_| RowTemplate::default()).collect())
    }

    pub fn with_region(
        mut self,
        first_col: u32,
        first_row: u32,
        last_col: u32,
        last_row: u32,
    ) -> Result<Self, ModelError> {
        self.add_region(first_col, first_row, last_col, last_row)?;
        Ok(self)
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    pub fn rows(&self) -> &[RowTemplate] {
        &self.rows
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<&CellTemplate> {
        self.rows.get(row as usize).and_then(|r| r.cell(col))
    }

    /// Every region covering (col, row). Linear scan, no particular order.
    pub fn regions_containing(&self, col: u32, row: u32) -> Vec<Region> {
        self.regions
            .iter()
            .filter(|r| r.contains(col, row))
            .copied()
            .collect()
    }

    /// Verifies the geometry invariant for every region.
    pub fn check_regions(&self) -> Result<(), ModelError> {
        for region in &self.regions {
            self.check_bounds(region.first_col, region.first_row, region.last_col, region.last_row)?;
        }
        Ok(())
    }

    // ========================================================================
    // REGIONS
    // ========================================================================

    /// Adds a merged region. Fails when inverted or outside the current area.
    pub fn add_region(
        &mut self,
        first_col: u32,
        first_row: u32,
        last_col: u32,
        last_row: u32,
    ) -> Result<Region, ModelError> {
        self.check_bounds(first_col, first_row, last_col, last_row)?;
        let region = Region {
            first_col,
            first_row,
            last_col,
            last_row,
        };
        self.regions.push(region);
        Ok(region)
    }

    fn check_bounds(
        &self,
        first_col: u32,
        first_row: u32,
        last_col: u32,
        last_row: u32,
    ) -> Result<(), ModelError> {
        if first_col > last_col || first_row > last_row {
            return Err(ModelError::InvertedRegion {
                first_col,
                first_row,
                last_col,
                last_row,
            });
        }
        if last_col >= self.column_count || last_row >= self.row_count() {
            return Err(ModelError::RegionOutOfBounds {
                first_col,
                first_row,
                last_col,
                last_row,
                column_count: self.column_count,
                row_count: self.row_count(),
            });
        }
        Ok(())
    }

    /// Translates every region by `row_offset` output rows.
    pub fn make_output_regions(&self, row_offset: u32) -> Result<Vec<AbsoluteRegion>, ModelError> {
        self.regions
            .iter()
            .map(|r| {
                let first_row = r.first_row.checked_add(row_offset);
                let last_row = r.last_row.checked_add(row_offset);
                match (first_row, last_row) {
                    (Some(first_row), Some(last_row)) if last_row < MAX_SHEET_ROWS => Ok(AbsoluteRegion {
                        first_row,
                        first_col: r.first_col,
                        last_row,
                        last_col: r.last_col,
                    }),
                    _ => Err(ModelError::OffsetOverflow { offset: row_offset }),
                }
            })
            .collect()
    }

    // ========================================================================
    // COLUMN MUTATIONS
    // ========================================================================

    /// Deletes template column `col`, returning the removed cell of every row
    /// (None where the row had no cell there).
    pub fn remove_column(&mut self, col: u32) -> Result<Vec<Option<CellTemplate>>, ModelError> {
        if col >= self.column_count {
            return Err(ModelError::ColumnOutOfRange {
                col,
                column_count: self.column_count,
            });
        }

        self.regions.retain_mut(|region| {
            if region.first_col > col {
                region.first_col -= 1;
                region.last_col -= 1;
            } else if region.last_col >= col {
                if region.first_col == region.last_col {
                    return false;
                }
                region.last_col -= 1;
            }
            true
        });

        let removed = self
            .rows
            .iter_mut()
            .map(|row| {
                if (col as usize) < row.cells.len() {
                    row.cells.remove(col as usize)
                } else {
                    None
                }
            })
            .collect();

        self.column_count -= 1;
        Ok(removed)
    }

    /// Inserts one cell per row at `col`, shifting later columns right.
    /// `cells` must hold exactly one entry per row.
    pub fn add_column(&mut self, col: u32, cells: Vec<Option<CellTemplate>>) -> Result<(), ModelError> {
        if col > self.column_count {
            return Err(ModelError::ColumnOutOfRange {
                col,
                column_count: self.column_count,
            });
        }
        if cells.len() != self.rows.len() {
            return Err(ModelError::CellCountMismatch {
                expected: self.rows.len(),
                actual: cells.len(),
            });
        }

        for (row, cell) in self.rows.iter_mut().zip(cells) {
            if row.cells.len() < col as usize {
                row.cells.resize(col as usize, None);
            }
            row.cells.insert(col as usize, cell);
        }

        for region in &mut self.regions {
            if region.first_col >= col {
                region.first_col += 1;
                region.last_col += 1;
            } else if region.last_col >= col {
                region.last_col += 1;
            }
        }

        self.column_count += 1;
        Ok(())
    }

    // ========================================================================
    // ROW MUTATIONS
    // ========================================================================

    /// Deletes template row `row` and returns it.
    pub fn remove_row(&mut self, row: u32) -> Result<RowTemplate, ModelError> {
        if row >= self.row_count() {
            return Err(ModelError::RowOutOfRange {
                row,
                row_count: self.row_count(),
            });
        }

        self.regions.retain_mut(|region| {
            if region.first_row > row {
                region.first_row -= 1;
                region.last_row -= 1;
            } else if region.last_row >= row {
                if region.first_row == region.last_row {
                    return false;
                }
                region.last_row -= 1;
            }
            true
        });

        Ok(self.rows.remove(row as usize))
    }

    /// Inserts a row at `row`, shifting later rows down. A row wider than the
    /// area widens it.
    pub fn add_row(&mut self, row: u32, template: impl Into<RowTemplate>) -> Result<(), ModelError> {
        if row > self.row_count() {
            return Err(ModelError::RowOutOfRange {
                row,
                row_count: self.row_count(),
            });
        }

        let mut template = template.into();
        let width = template.populated_width();
        template.cells.truncate(width.max(self.column_count) as usize);
        self.column_count = self.column_count.max(width);
        self.rows.insert(row as usize, template);

        for region in &mut self.regions {
            if region.first_row >= row {
                region.first_row += 1;
                region.last_row += 1;
            } else if region.last_row >= row {
                region.last_row += 1;
            }
        }
        Ok(())
    }
}

impl From<Vec<Option<CellTemplate>>> for RowTemplate {
    fn from(cells: Vec<Option<CellTemplate>>) -> Self {
        RowTemplate::new(cells)
    }
}

impl TryFrom<AreaDefinition> for Area {
    type Error = ModelError;

    fn try_from(def: AreaDefinition) -> Result<Self, Self::Error> {
        let mut area = Area::new(def.rows).with_hidden(def.hidden);
        for r in def.regions {
            area.add_region(r.first_col, r.first_row, r.last_col, r.last_row)?;
        }
        Ok(area)
    }
}

impl From<Area> for AreaDefinition {
    fn from(area: Area) -> Self {
        AreaDefinition {
            rows: area.rows,
            regions: area.regions,
            hidden: area.hidden,
        }
    }
}
