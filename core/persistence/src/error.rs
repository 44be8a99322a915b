//! FILENAME: core/persistence/src/error.rs

use report_engine::DataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

/// Xlsx failures surface to the renderer as data source failures.
impl From<PersistenceError> for DataError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::SheetNotFound(name) => DataError::UnknownSource(name),
            other => DataError::Backend {
                source_name: "xlsx".to_string(),
                message: other.to_string(),
            },
        }
    }
}
