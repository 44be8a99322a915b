//! FILENAME: core/report-engine/src/group_manager.rs
//! PURPOSE: Tracks the open grouping boundaries while a sorted stream is read.
//! CONTEXT: One `init_record` / `finalize_record` pair per record, then
//! `finalize_all_groups` at the end of the stream. Output goes through the
//! `GroupRenderer` passed into each call; the manager itself only decides
//! when groups open and close and which rows belong to them.
//!
//! Open groups always form a prefix of the declared levels: the group at
//! stack index `i` belongs to level `i`. A header is written only when its
//! group closes, after every record under it. Top headers have their rows
//! reserved when the group opens; Bottom headers take rows on close.

use report_model::{validate_levels, Area, CellValue, GroupModel, HeaderPosition, Record};

use smallvec::SmallVec;

use crate::error::{DataError, RenderError};
use crate::group::{Group, RecordsHeight};
use crate::logging::{log_debug, GROUP};

/// Output side of the group manager.
pub trait GroupRenderer {
    /// Row where the next output goes.
    fn current_row(&self) -> u32;

    /// Claims `count` blank rows at the current row and returns the first.
    fn reserve_rows(&mut self, count: u32) -> Result<u32, RenderError>;

    /// Writes the header (or footer) of a closing group at `row`.
    fn render_group(&mut self, group: &Group<'_>, area: &Area, row: u32) -> Result<(), RenderError>;

    /// Outlines rows `first..=last`, zero height when `collapsed`.
    fn outline_rows(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), RenderError>;
}

#[derive(Debug)]
pub struct GroupManager<'m> {
    levels: &'m [GroupModel],
    open: Vec<Group<'m>>,
    /// The outermost level has no discriminator and wraps the whole stream.
    has_total_level: bool,
}

impl<'m> GroupManager<'m> {
    pub fn new(levels: &'m [GroupModel]) -> Result<Self, RenderError> {
        validate_levels(levels)?;
        Ok(GroupManager {
            levels,
            open: Vec::new(),
            has_total_level: levels.first().is_some_and(|l| !l.has_discriminator()),
        })
    }

    pub fn levels(&self) -> &'m [GroupModel] {
        self.levels
    }

    /// Open groups, outermost first.
    pub fn open_groups(&self) -> &[Group<'m>] {
        &self.open
    }

    pub fn has_total_level(&self) -> bool {
        self.has_total_level
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Number of open groups, counted from the outermost, that accept `record`.
    pub fn check_valid_groups(&self, record: &Record) -> Result<usize, RenderError> {
        for (index, group) in self.open.iter().enumerate() {
            let value = discriminator_value(group.model, record)?;
            if !group.accepts(value) {
                return Ok(index);
            }
        }
        Ok(self.open.len())
    }

    /// Closes the groups `record` leaves, opens the ones it starts, and
    /// attributes the current row to the innermost open group.
    pub fn init_record(&mut self, record: &Record, renderer: &mut dyn GroupRenderer) -> Result<(), RenderError> {
        let valid_depth = self.check_valid_groups(record)?;
        self.close_down_to(valid_depth, renderer)?;

        let levels = self.levels;
        for (index, model) in levels.iter().enumerate().skip(valid_depth) {
            let discriminator = discriminator_value(model, record)?.cloned();

            if model.skip_empty_groups && discriminator.as_ref().is_some_and(CellValue::is_empty) {
                log_debug!(GROUP, "level {} skipped for an empty discriminator", index);
                break;
            }

            let level = capture_level(model, index, record)?;
            let depth = match self.open.last() {
                Some(parent) if parent.model.has_discriminator() => parent.depth + 1,
                Some(parent) => parent.depth,
                None => 0,
            };

            let (start_row, content_start) = match model.position {
                HeaderPosition::Top => {
                    let first = renderer.reserve_rows(model.row_height)?;
                    (first, first + model.row_height)
                }
                HeaderPosition::Bottom => {
                    let row = renderer.current_row();
                    (row, row)
                }
            };

            log_debug!(
                GROUP,
                "open level={} value={:?} depth={} row={}",
                index,
                discriminator,
                depth,
                start_row
            );

            self.open.push(Group {
                model,
                index,
                discriminator,
                level,
                start_row,
                content_start,
                content_end: None,
                depth,
                children: Vec::new(),
                records: SmallVec::new(),
                records_height: RecordsHeight::Unset,
                record: record.clone(),
            });
        }

        let row = renderer.current_row();
        if let Some(innermost) = self.open.last_mut() {
            innermost.records.push(row);
        }
        Ok(())
    }

    /// Records how many rows the current record took, ending at `current_row`.
    pub fn finalize_record(&mut self, current_row: u32) {
        if let Some(innermost) = self.open.last_mut() {
            if let Some(&first) = innermost.records.last() {
                let height = current_row.saturating_sub(first);
                innermost.records_height = innermost.records_height.observe(height);
            }
        }
    }

    /// Closes every open group, innermost first.
    pub fn finalize_all_groups(&mut self, renderer: &mut dyn GroupRenderer) -> Result<(), RenderError> {
        self.close_down_to(0, renderer)
    }

    fn close_down_to(&mut self, depth: usize, renderer: &mut dyn GroupRenderer) -> Result<(), RenderError> {
        while self.open.len() > depth {
            self.close_innermost(renderer)?;
        }
        Ok(())
    }

    fn close_innermost(&mut self, renderer: &mut dyn GroupRenderer) -> Result<(), RenderError> {
        let Some(mut group) = self.open.pop() else {
            return Ok(());
        };

        let model = group.model;
        let content_end = renderer.current_row();
        group.content_end = Some(content_end);

        if model.position == HeaderPosition::Bottom {
            group.start_row = renderer.reserve_rows(model.row_height)?;
        }

        let area = group.header_area().ok_or(DataError::MissingLevelStyle {
            index: group.index,
            level: group.level.unwrap_or_default(),
        })?;
        renderer.render_group(&group, area, group.start_row)?;

        if model.collapsible && content_end > group.content_start {
            renderer.outline_rows(group.content_start, content_end - 1, model.collapsed)?;
        }

        log_debug!(
            GROUP,
            "close level={} value={:?} records={} children={}",
            group.index,
            group.discriminator,
            group.records.len(),
            group.children.len()
        );

        if let Some(parent) = self.open.last_mut() {
            parent.children.push(group);
        }
        Ok(())
    }
}

/// The record's discriminator for `model`; None when the level has none.
fn discriminator_value<'r>(model: &GroupModel, record: &'r Record) -> Result<Option<&'r CellValue>, DataError> {
    match &model.discriminator_field {
        None => Ok(None),
        Some(field) => record
            .get(field)
            .map(Some)
            .ok_or_else(|| DataError::UnknownField(field.clone())),
    }
}

/// Reads the style level; null reads as "use the default style".
fn capture_level(model: &GroupModel, index: usize, record: &Record) -> Result<Option<u32>, DataError> {
    let Some(field) = &model.level_field else {
        return Ok(None);
    };
    let value = record.get(field).ok_or_else(|| DataError::UnknownField(field.clone()))?;
    let level = match value {
        CellValue::Empty => return Ok(None),
        CellValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => *n as u32,
        other => {
            return Err(DataError::NonNumericLevel {
                field: field.clone(),
                value: other.display_value(),
            })
        }
    };
    if model.style_for(Some(level)).is_none() {
        return Err(DataError::MissingLevelStyle { index, level });
    }
    Ok(Some(level))
}
