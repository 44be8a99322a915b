//! FILENAME: core/report-engine/src/error.rs

use report_model::ModelError;
use thiserror::Error;

/// Problems with the records flowing in: unreadable fields, bad level values,
/// or the data source itself failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("record has no field '{0}'")]
    UnknownField(String),

    #[error("level field '{field}' holds '{value}', expected a non-negative integer")]
    NonNumericLevel { field: String, value: String },

    #[error("no style area for level {level} of grouping level {index}")]
    MissingLevelStyle { index: usize, level: u32 },

    #[error("data source '{0}' has no more records")]
    Exhausted(String),

    #[error("data source '{0}' does not support read-ahead")]
    ReadAheadUnsupported(String),

    #[error("unknown data source '{0}'")]
    UnknownSource(String),

    #[error("data source '{source_name}' failed: {message}")]
    Backend { source_name: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("expression refers to unknown field '{0}'")]
    UnknownField(String),

    #[error("malformed macro call '{0}'")]
    MalformedMacro(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("unknown macro '{0}'")]
    Unknown(String),

    #[error("macro '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

impl MacroError {
    pub fn failed(name: &str, message: impl Into<String>) -> Self {
        MacroError::Failed {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("no sheet has been started")]
    NoSheet,

    #[error("workbook sink failed: {0}")]
    Backend(String),
}

/// Everything a render can fail with. The partial output is left to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Macro(#[from] MacroError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("reserving {requested} rows at row {row} exceeds the sheet limit of {max_rows}")]
    RowLimit { row: u32, requested: u32, max_rows: u32 },
}
