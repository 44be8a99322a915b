//! FILENAME: core/report-engine/src/group.rs
//! Runtime group - one open grouping boundary over the record stream.
//!
//! A Group is created by the `GroupManager` on the first record of a new
//! boundary, collects the rows of the records and sub-groups under it, is
//! rendered exactly once when it closes, and then moves into its parent's
//! `children` (or is dropped at the outermost level).

use report_model::{coord_to_a1, range_to_a1, Area, CellValue, GroupModel, Record};
use smallvec::SmallVec;

/// Row count shared by the records directly under a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordsHeight {
    /// No record finished yet.
    #[default]
    Unset,
    Uniform(u32),
    /// Two records differed; never becomes uniform again.
    Mixed,
}

impl RecordsHeight {
    pub fn observe(self, height: u32) -> Self {
        match self {
            RecordsHeight::Unset => RecordsHeight::Uniform(height),
            RecordsHeight::Uniform(h) if h == height => self,
            _ => RecordsHeight::Mixed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group<'m> {
    pub(crate) model: &'m GroupModel,
    /// Index of the declared level this group belongs to.
    pub(crate) index: usize,
    pub(crate) discriminator: Option<CellValue>,
    pub(crate) level: Option<u32>,
    /// Absolute output row of the header. For footer groups this is set on close.
    pub(crate) start_row: u32,
    pub(crate) content_start: u32,
    /// Exclusive end of the content rows, set on close.
    pub(crate) content_end: Option<u32>,
    pub(crate) depth: u32,
    pub(crate) children: Vec<Group<'m>>,
    pub(crate) records: SmallVec<[u32; 8]>,
    pub(crate) records_height: RecordsHeight,
    pub(crate) record: Record,
}

impl<'m> Group<'m> {
    pub fn model(&self) -> &'m GroupModel {
        self.model
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Captured discriminator; None for the unconditional level.
    pub fn discriminator(&self) -> Option<&CellValue> {
        self.discriminator.as_ref()
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn children(&self) -> &[Group<'m>] {
        &self.children
    }

    /// First output row of every record attributed directly to this group.
    pub fn records(&self) -> &[u32] {
        &self.records
    }

    pub fn records_height(&self) -> Option<u32> {
        match self.records_height {
            RecordsHeight::Uniform(h) => Some(h),
            _ => None,
        }
    }

    /// The record that opened the group; header cells evaluate against it.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Content rows as a half-open range, once the group has closed.
    pub fn content_rows(&self) -> Option<std::ops::Range<u32>> {
        self.content_end.map(|end| self.content_start..end)
    }

    /// Header area for the captured level.
    pub fn header_area(&self) -> Option<&'m Area> {
        self.model.style_for(self.level)
    }

    /// True when `value` belongs in this group.
    pub fn accepts(&self, value: Option<&CellValue>) -> bool {
        match &self.discriminator {
            None => true,
            Some(stored) => value == Some(stored),
        }
    }

    /// A1 reference covering this group's content in column `col`.
    ///
    /// `header_offset` is the row of the aggregate inside this group's header;
    /// each sub-group contributes the cell at the same offset in its own
    /// header, clamped to that header's height. Records attributed directly
    /// to a group that also has sub-groups are listed alongside them in row
    /// order. Without sub-groups the records collapse to a range when they are
    /// contiguous and equally tall.
    pub fn content_reference(&self, col: u32, header_offset: u32) -> Option<String> {
        if !self.children.is_empty() {
            let mut rows: Vec<u32> = self
                .children
                .iter()
                .map(|child| child.start_row + header_offset.min(child.model.row_height.saturating_sub(1)))
                .chain(self.records.iter().copied())
                .collect();
            rows.sort_unstable();
            let cells: Vec<String> = rows.into_iter().map(|row| coord_to_a1((row, col))).collect();
            return Some(cells.join(","));
        }

        let first = *self.records.first()?;
        let last = *self.records.last()?;

        if let Some(height) = self.records_height() {
            let contiguous = self.records.windows(2).all(|pair| pair[1] == pair[0] + height);
            if contiguous && height > 0 {
                return Some(range_to_a1((first, col), (last + height - 1, col)));
            }
        }

        let cells: Vec<String> = self.records.iter().map(|&row| coord_to_a1((row, col))).collect();
        Some(cells.join(","))
    }
}
