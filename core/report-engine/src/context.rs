//! FILENAME: core/report-engine/src/context.rs
//! PURPOSE: Per-section bookkeeping while rendering, and the frozen history.
//! CONTEXT: Every section run gets a `SectionContext`. When the run ends the
//! context is frozen into a `SectionSnapshot` and appended to the render's
//! `RenderHistory`, where later sections (through macros) can find the
//! output row of "record N of section X".

use report_model::{SectionId, Record};
use rustc_hash::FxHashMap;

use crate::group_manager::GroupManager;

// ============================================================================
// LIVE CONTEXT
// ============================================================================

#[derive(Debug)]
pub struct SectionContext<'m> {
    pub(crate) id: SectionId,
    pub(crate) first_row: u32,
    /// Row where the current record begins.
    pub(crate) record_row: u32,
    pub(crate) record_count: usize,
    pub(crate) record_rows: Vec<u32>,
    /// Whether records remain after the current one.
    pub(crate) has_more: bool,
    /// Live for Grouping/Composite sections. Taken out while the manager runs.
    pub(crate) groups: Option<GroupManager<'m>>,
    /// Record currently being rendered.
    pub(crate) record: Option<Record>,
}

impl<'m> SectionContext<'m> {
    pub fn new(id: impl Into<SectionId>, first_row: u32) -> Self {
        SectionContext {
            id: id.into(),
            first_row,
            record_row: first_row,
            record_count: 0,
            record_rows: Vec::new(),
            has_more: false,
            groups: None,
            record: None,
        }
    }

    pub fn with_groups(mut self, groups: GroupManager<'m>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn record_row(&self) -> u32 {
        self.record_row
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn groups(&self) -> Option<&GroupManager<'m>> {
        self.groups.as_ref()
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Marks the start of the next record at `row`.
    pub(crate) fn begin_record(&mut self, row: u32, record: Record, has_more: bool) {
        self.record_row = row;
        self.record_count += 1;
        self.record_rows.push(row);
        self.has_more = has_more;
        self.record = Some(record);
    }

    /// Freezes the run that ended at `end_row` (exclusive).
    pub fn snapshot(&self, end_row: u32) -> SectionSnapshot {
        SectionSnapshot {
            id: self.id.clone(),
            first_row: self.first_row,
            end_row,
            record_rows: self.record_rows.clone(),
        }
    }
}

// ============================================================================
// FROZEN HISTORY
// ============================================================================

/// Immutable record of one finished section run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSnapshot {
    pub id: SectionId,
    pub first_row: u32,
    /// Exclusive.
    pub end_row: u32,
    pub record_rows: Vec<u32>,
}

impl SectionSnapshot {
    /// First output row of record `n` (0-based).
    pub fn row_of(&self, n: usize) -> Option<u32> {
        self.record_rows.get(n).copied()
    }

    pub fn record_count(&self) -> usize {
        self.record_rows.len()
    }

    /// Rows the run occupied, as a half-open range.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.first_row..self.end_row
    }
}

/// Append-only map of finished runs, owned by one render.
#[derive(Debug, Clone, Default)]
pub struct RenderHistory {
    runs: FxHashMap<SectionId, Vec<SectionSnapshot>>,
}

impl RenderHistory {
    pub fn new() -> Self {
        RenderHistory::default()
    }

    pub(crate) fn push(&mut self, snapshot: SectionSnapshot) {
        self.runs.entry(snapshot.id.clone()).or_default().push(snapshot);
    }

    /// Most recent run of `id`.
    pub fn latest(&self, id: &str) -> Option<&SectionSnapshot> {
        self.runs.get(id).and_then(|runs| runs.last())
    }

    /// Every run of `id`, in render order.
    pub fn runs(&self, id: &str) -> &[SectionSnapshot] {
        self.runs.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rows() {
        let mut ctx = SectionContext::new("lines", 4);
        ctx.begin_record(4, Record::new(), true);
        ctx.begin_record(6, Record::new(), false);
        let snap = ctx.snapshot(9);
        assert_eq!(snap.row_of(1), Some(6));
        assert_eq!(snap.row_of(2), None);
        assert_eq!(snap.rows(), 4..9);
        assert_eq!(ctx.record_count(), 2);
        assert!(!ctx.has_more());
    }

    #[test]
    fn test_history_keeps_every_run() {
        let mut history = RenderHistory::new();
        history.push(SectionContext::new("lines", 0).snapshot(2));
        history.push(SectionContext::new("lines", 5).snapshot(7));
        assert_eq!(history.runs("lines").len(), 2);
        assert_eq!(history.latest("lines").map(|s| s.first_row), Some(5));
        assert!(history.latest("other").is_none());
        assert_eq!(history.len(), 2);
    }
}
