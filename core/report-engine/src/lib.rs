//! FILENAME: core/report-engine/src/lib.rs
//! PURPOSE: Main library entry point for the report render engine.
//! CONTEXT: Drives report templates (from `report-model`) over data sources
//! and writes the result through a `WorkbookSink`.

pub mod logging;

pub mod context;
pub mod error;
pub mod eval;
pub mod group;
pub mod group_manager;
pub mod macros;
pub mod render;
pub mod section;
pub mod sink;
pub mod source;

// Re-export commonly used types at the crate root
pub use context::{RenderHistory, SectionContext, SectionSnapshot};
pub use error::{DataError, EvalError, MacroError, RenderError, SinkError};
pub use eval::{CellEvaluator, Evaluated, FieldEvaluator};
pub use group::{Group, RecordsHeight};
pub use group_manager::{GroupManager, GroupRenderer};
pub use macros::{Macro, MacroContext, MacroDispatcher, MacroRegistry};
pub use render::{SheetWriter, StampScope};
pub use section::{RenderSummary, ReportRenderer, SheetSummary};
pub use sink::WorkbookSink;
pub use source::{with_source, DataSource, DataSourceProvider, DetailLink, InMemoryProvider, VecDataSource};
