//! FILENAME: core/persistence/src/lib.rs
//! Report Persistence Module
//!
//! Saves rendered reports in XLSX format and reads XLSX sheets back, either
//! as report data sources or as plain cell grids.

mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use error::PersistenceError;
pub use xlsx_reader::{load_xlsx, SheetDataSource, XlsxProvider};
pub use xlsx_writer::{save_xlsx, save_xlsx_to_buffer};

use std::path::Path;

use report_engine::{DataSourceProvider, FieldEvaluator, MacroRegistry, RenderError, RenderSummary, ReportRenderer};
use report_model::{OutputWorkbook, Record, ReportModel};
use thiserror::Error;

/// Log target for file IO.
pub(crate) const PERSIST: &str = "PERSIST";

/// Either half of a render-to-file run failing.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Renders `model` with the field evaluator and the built-in macros, then
/// saves the result to `path`. Nothing is written when the render fails.
pub fn render_to_xlsx(
    model: &ReportModel,
    params: &Record,
    provider: &mut dyn DataSourceProvider,
    path: &Path,
) -> Result<RenderSummary, ExportError> {
    let evaluator = FieldEvaluator::new();
    let report_macros = MacroRegistry::new();
    let global_macros = MacroRegistry::with_builtins();
    let renderer = ReportRenderer::new(&evaluator, &report_macros, &global_macros);

    let mut book = OutputWorkbook::new();
    let summary = renderer.render(model, params, provider, &mut book)?;
    save_xlsx(&book, &model.styles, path)?;
    Ok(summary)
}
