//! FILENAME: core/report-model/src/region.rs
//! PURPOSE: Merged-cell rectangles, template-relative and absolute.

use serde::{Deserialize, Serialize};

use crate::coord::range_to_a1;

/// A merged-cell range inside an Area, inclusive, template-relative.
/// Only an `Area` creates or mutates these; see `Area::add_region`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub first_col: u32,
    pub first_row: u32,
    pub last_col: u32,
    pub last_row: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    pub fn height(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        col >= self.first_col && col <= self.last_col && row >= self.first_row && row <= self.last_row
    }
}

/// A merged range in output-sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsoluteRegion {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl AbsoluteRegion {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    /// True when the two ranges share at least one cell.
    pub fn overlaps(&self, other: &AbsoluteRegion) -> bool {
        !(self.last_row < other.first_row
            || self.first_row > other.last_row
            || self.last_col < other.first_col
            || self.first_col > other.last_col)
    }

    pub fn to_a1(&self) -> String {
        range_to_a1((self.first_row, self.first_col), (self.last_row, self.last_col))
    }
}
