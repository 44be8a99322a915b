//! FILENAME: core/report-model/src/lib.rs
//! PURPOSE: Main library entry point for the report template model.
//! CONTEXT: Re-exports public types and modules for use by the render engine
//! and persistence crates.

pub mod area;
pub mod coord;
pub mod error;
pub mod grid;
pub mod grouping;
pub mod region;
pub mod report;
pub mod section;
pub mod style;
pub mod template;
pub mod value;

// Re-export commonly used types at the crate root
pub use area::{Area, AreaDefinition};
pub use coord::{col_to_index, coord_to_a1, index_to_col, range_to_a1, CellCoord, MAX_SHEET_COLS, MAX_SHEET_ROWS};
pub use error::ModelError;
pub use grid::{Grid, OutputCell, OutputSheet, OutputWorkbook, RowGroup};
pub use grouping::{validate_levels, GroupModel, HeaderPosition};
pub use region::{AbsoluteRegion, Region};
pub use report::{RenderSettings, ReportModel, SheetModel};
pub use section::{OptionalColumn, SectionId, SectionKind, SectionModel};
pub use style::{CellStyle, Color, FontStyle, StyleRegistry, TextAlign, VerticalAlign};
pub use template::{CellContent, CellTemplate, RowTemplate};
pub use value::{CellValue, Record};
