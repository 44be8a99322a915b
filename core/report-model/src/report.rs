//! FILENAME: core/report-model/src/report.rs
//! Report Definition - the serializable root of a report.
//!
//! These structures are designed to be:
//! - Serializable (the report definition is loaded from JSON)
//! - Immutable while rendering; the renderer works on its own copies

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::coord::MAX_SHEET_ROWS;
use crate::error::ModelError;
use crate::section::SectionModel;
use crate::style::StyleRegistry;

// ============================================================================
// SETTINGS
// ============================================================================

/// Controls where and how far rendering may write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output row where the first section of every sheet starts.
    pub first_row: u32,
    /// Rows available on a sheet; reserving past this fails the render.
    pub max_rows: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            first_row: 0,
            max_rows: MAX_SHEET_ROWS,
        }
    }
}

// ============================================================================
// SHEETS AND REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetModel {
    pub name: String,
    pub sections: Vec<SectionModel>,
}

impl SheetModel {
    pub fn new(name: impl Into<String>, sections: Vec<SectionModel>) -> Self {
        SheetModel {
            name: name.into(),
            sections,
        }
    }

    /// Sections in rendering order. Ties keep declaration order.
    pub fn ordered_sections(&self) -> Vec<&SectionModel> {
        let mut sections: Vec<&SectionModel> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportModel {
    pub name: String,
    pub sheets: Vec<SheetModel>,
    #[serde(default)]
    pub styles: StyleRegistry,
    #[serde(default)]
    pub settings: RenderSettings,
}

impl ReportModel {
    pub fn new(name: impl Into<String>) -> Self {
        ReportModel {
            name: name.into(),
            sheets: Vec::new(),
            styles: StyleRegistry::new(),
            settings: RenderSettings::default(),
        }
    }

    pub fn with_sheet(mut self, sheet: SheetModel) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Parses and validates a JSON report definition.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: ReportModel =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidDefinition(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::InvalidDefinition(e.to_string()))
    }

    /// Grouping rules for every section, section ids unique across the report,
    /// and a usable row window.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.settings.first_row >= self.settings.max_rows || self.settings.max_rows > MAX_SHEET_ROWS {
            return Err(ModelError::InvalidDefinition(format!(
                "first_row {} / max_rows {} leave no room on the sheet",
                self.settings.first_row, self.settings.max_rows
            )));
        }

        let mut seen = HashSet::new();
        for sheet in &self.sheets {
            for section in &sheet.sections {
                section.validate()?;
                let mut ids = Vec::new();
                section.collect_ids(&mut ids);
                for id in ids {
                    if !seen.insert(id) {
                        return Err(ModelError::InvalidDefinition(format!("duplicate section id '{}'", id)));
                    }
                }
            }
        }
        Ok(())
    }
}
