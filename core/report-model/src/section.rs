//! FILENAME: core/report-model/src/section.rs
//! Section Definition - the units a sheet is made of.
//!
//! A section is a named, orderable piece of report content bound to zero or
//! one data source. The three kinds are a closed set, so orchestration matches
//! on `SectionKind` exhaustively instead of dispatching through a trait.

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::error::ModelError;
use crate::grouping::{validate_levels, GroupModel};

/// Unique identifier of a section within a report.
pub type SectionId = String;

/// A template column kept only when a render parameter is switched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalColumn {
    /// Template column (in the section's areas) to drop.
    pub column: u32,
    /// Render parameter that keeps the column when true.
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionKind {
    /// One area per record, no grouping.
    Plain { area: Area },
    /// Grouped stream: group header areas per level, `record_area` per leaf record.
    Grouping {
        levels: Vec<GroupModel>,
        record_area: Area,
    },
    /// Grouped stream whose records each render a list of child sections.
    Composite {
        #[serde(default)]
        levels: Vec<GroupModel>,
        children: Vec<SectionModel>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionModel {
    pub id: SectionId,

    #[serde(default)]
    pub name: Option<String>,

    /// Rendering order within the sheet (stable for ties).
    #[serde(default)]
    pub order: i32,

    /// Name of the data source; None renders the section once.
    #[serde(default)]
    pub data_source: Option<String>,

    pub kind: SectionKind,

    #[serde(default)]
    pub optional_columns: Vec<OptionalColumn>,
}

impl SectionModel {
    pub fn plain(id: impl Into<SectionId>, area: Area) -> Self {
        SectionModel::with_kind(id, SectionKind::Plain { area })
    }

    pub fn grouping(id: impl Into<SectionId>, levels: Vec<GroupModel>, record_area: Area) -> Self {
        SectionModel::with_kind(id, SectionKind::Grouping { levels, record_area })
    }

    pub fn composite(id: impl Into<SectionId>, levels: Vec<GroupModel>, children: Vec<SectionModel>) -> Self {
        SectionModel::with_kind(id, SectionKind::Composite { levels, children })
    }

    fn with_kind(id: impl Into<SectionId>, kind: SectionKind) -> Self {
        SectionModel {
            id: id.into(),
            name: None,
            order: 0,
            data_source: None,
            kind,
            optional_columns: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_optional_column(mut self, column: u32, parameter: impl Into<String>) -> Self {
        self.optional_columns.push(OptionalColumn {
            column,
            parameter: parameter.into(),
        });
        self
    }

    /// Grouping levels for Grouping/Composite sections (empty for Plain).
    pub fn levels(&self) -> &[GroupModel] {
        match &self.kind {
            SectionKind::Plain { .. } => &[],
            SectionKind::Grouping { levels, .. } | SectionKind::Composite { levels, .. } => levels,
        }
    }

    /// Every area owned directly by this section (children excluded).
    pub fn areas_mut(&mut self) -> Vec<&mut Area> {
        match &mut self.kind {
            SectionKind::Plain { area } => vec![area],
            SectionKind::Grouping { levels, record_area } => {
                let mut areas: Vec<&mut Area> = levels.iter_mut().flat_map(|level| level.styles_mut()).collect();
                areas.push(record_area);
                areas
            }
            SectionKind::Composite { levels, .. } => levels.iter_mut().flat_map(|level| level.styles_mut()).collect(),
        }
    }

    /// Removes template column `col` from every area of this section. Areas
    /// too narrow to have that column are left alone.
    pub fn remove_template_column(&mut self, col: u32) -> Result<(), ModelError> {
        for area in self.areas_mut() {
            if col < area.column_count() {
                area.remove_column(col)?;
            }
        }
        Ok(())
    }

    /// Validates the grouping levels of this section and its children.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_levels(self.levels())?;
        if let SectionKind::Composite { children, .. } = &self.kind {
            for child in children {
                child.validate()?;
            }
        }
        Ok(())
    }

    /// Ids of this section and all nested children, depth first.
    pub fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        if let SectionKind::Composite { children, .. } = &self.kind {
            for child in children {
                child.collect_ids(out);
            }
        }
    }
}
