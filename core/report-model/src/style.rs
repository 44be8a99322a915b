//! FILENAME: core/report-model/src/style.rs
//! PURPOSE: Style table shared by every template cell of a report.
//! CONTEXT: Flyweight storage. Template cells store a style index into the
//! report's `StyleRegistry`; the sink receives that index and the xlsx writer
//! resolves it. Index 0 is always the default style.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TextAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const fn black() -> Self {
        Color::new(0, 0, 0)
    }

    /// 0xRRGGBB, the form spreadsheet writers take.
    pub fn to_rgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Parse "#RRGGBB" or "RRGGBB".
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::new(r, g, b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FontStyle {
    pub family: String,
    /// Font size in points.
    pub size: u8,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle {
            family: "Calibri".to_string(),
            size: 11,
            bold: false,
            italic: false,
            underline: false,
            color: Color::black(),
        }
    }
}

/// Complete cell style definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CellStyle {
    pub font: FontStyle,
    /// None leaves the cell unfilled.
    pub background: Option<Color>,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// Spreadsheet number format code, e.g. "#,##0.00".
    pub number_format: Option<String>,
    pub wrap_text: bool,
}

impl CellStyle {
    pub fn new() -> Self {
        CellStyle::default()
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_text_align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    pub fn with_number_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = Some(format.into());
        self
    }

    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// Stores unique styles and hands out indices for template cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<CellStyle>", into = "Vec<CellStyle>")]
pub struct StyleRegistry {
    styles: Vec<CellStyle>,
    style_to_index: HashMap<CellStyle, usize>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry::from(Vec::new())
    }

    /// Returns the index of an equal style, adding it when new.
    pub fn get_or_create(&mut self, style: CellStyle) -> usize {
        if let Some(&index) = self.style_to_index.get(&style) {
            return index;
        }
        let index = self.styles.len();
        self.style_to_index.insert(style.clone(), index);
        self.styles.push(style);
        index
    }

    /// Out-of-range indices resolve to the default style.
    pub fn get(&self, index: usize) -> &CellStyle {
        self.styles.get(index).unwrap_or(&self.styles[0])
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style is registered.
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    pub fn all_styles(&self) -> &[CellStyle] {
        &self.styles
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        StyleRegistry::new()
    }
}

impl From<Vec<CellStyle>> for StyleRegistry {
    fn from(styles: Vec<CellStyle>) -> Self {
        let mut registry = StyleRegistry {
            styles: vec![CellStyle::default()],
            style_to_index: HashMap::new(),
        };
        registry.style_to_index.insert(CellStyle::default(), 0);
        // A serialized table already starts with the default style.
        let skip = usize::from(styles.first().is_some_and(CellStyle::is_default));
        for style in styles.into_iter().skip(skip) {
            // Keep positions stable: duplicates still occupy their slot.
            let index = registry.styles.len();
            registry.style_to_index.entry(style.clone()).or_insert(index);
            registry.styles.push(style);
        }
        registry
    }
}

impl From<StyleRegistry> for Vec<CellStyle> {
    fn from(registry: StyleRegistry) -> Self {
        registry.styles
    }
}
