//! FILENAME: core/report-model/src/grouping.rs
//! Grouping definitions - one `GroupModel` per declared grouping level.
//!
//! Levels are declared outermost first. Only the outermost level may omit its
//! discriminator field; such a level is the unconditional "total" level that
//! wraps the whole data stream.

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::error::ModelError;

/// Where a group's own rows go relative to its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HeaderPosition {
    /// Header rows are reserved above the content when the group opens.
    #[default]
    Top,
    /// Footer rows are appended after the content when the group closes.
    Bottom,
}

/// Static description of one grouping level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupModel {
    /// Record field whose change of value starts a new group.
    #[serde(default)]
    pub discriminator_field: Option<String>,

    /// Record field holding the (numeric) style level for this group's header.
    #[serde(default)]
    pub level_field: Option<String>,

    /// Number of output rows the header occupies.
    pub row_height: u32,

    /// Outline the group's content rows.
    #[serde(default)]
    pub collapsible: bool,

    /// Start the outline collapsed (content rows zero height).
    #[serde(default)]
    pub collapsed: bool,

    /// Do not open a group (nor anything nested) for a null discriminator.
    #[serde(default)]
    pub skip_empty_groups: bool,

    #[serde(default)]
    pub position: HeaderPosition,

    /// Header area used when no level field is configured or the level is null.
    pub default_style: Area,

    /// Header areas indexed by the captured level value.
    #[serde(default)]
    pub level_styles: Vec<Area>,
}

impl GroupModel {
    /// A level keyed on `field`, whose header is `style`.
    pub fn new(field: impl Into<String>, style: Area) -> Self {
        GroupModel {
            discriminator_field: Some(field.into()),
            level_field: None,
            row_height: style.row_count(),
            collapsible: false,
            collapsed: false,
            skip_empty_groups: false,
            position: HeaderPosition::Top,
            default_style: style,
            level_styles: Vec::new(),
        }
    }

    /// The unconditional outermost level.
    pub fn total(style: Area) -> Self {
        GroupModel {
            discriminator_field: None,
            ..GroupModel::new(String::new(), style)
        }
    }

    pub fn with_level_styles(mut self, level_field: impl Into<String>, styles: Vec<Area>) -> Self {
        self.level_field = Some(level_field.into());
        self.row_height = styles
            .iter()
            .map(Area::row_count)
            .chain(std::iter::once(self.row_height))
            .max()
            .unwrap_or(0);
        self.level_styles = styles;
        self
    }

    pub fn with_skip_empty_groups(mut self, skip: bool) -> Self {
        self.skip_empty_groups = skip;
        self
    }

    pub fn with_outline(mut self, collapsible: bool, collapsed: bool) -> Self {
        self.collapsible = collapsible;
        self.collapsed = collapsed;
        self
    }

    pub fn with_position(mut self, position: HeaderPosition) -> Self {
        self.position = position;
        self
    }

    pub fn has_discriminator(&self) -> bool {
        self.discriminator_field.is_some()
    }

    /// Header area for a captured level; None when the level has no style.
    pub fn style_for(&self, level: Option<u32>) -> Option<&Area> {
        match (&self.level_field, level) {
            (Some(_), Some(level)) => self.level_styles.get(level as usize),
            _ => Some(&self.default_style),
        }
    }

    /// Every header area this level can stamp.
    pub fn styles(&self) -> impl Iterator<Item = &Area> {
        std::iter::once(&self.default_style).chain(self.level_styles.iter())
    }

    pub fn styles_mut(&mut self) -> impl Iterator<Item = &mut Area> {
        std::iter::once(&mut self.default_style).chain(self.level_styles.iter_mut())
    }
}

/// Checks a level list: only the outermost level may lack a discriminator,
/// and no header area may be taller than the rows its level reserves.
pub fn validate_levels(levels: &[GroupModel]) -> Result<(), ModelError> {
    for (index, level) in levels.iter().enumerate() {
        if index > 0 && !level.has_discriminator() {
            return Err(ModelError::MissingDiscriminator { level: index });
        }
        for style in level.styles() {
            if style.row_count() > level.row_height {
                return Err(ModelError::StyleTallerThanLevel {
                    level: index,
                    rows: style.row_count(),
                    row_height: level.row_height,
                });
            }
        }
    }
    Ok(())
}
