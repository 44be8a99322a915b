//! FILENAME: core/report-model/src/error.rs

use thiserror::Error;

/// Configuration errors: the report model itself is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("region ({first_col},{first_row})-({last_col},{last_row}) is inverted")]
    InvertedRegion {
        first_col: u32,
        first_row: u32,
        last_col: u32,
        last_row: u32,
    },

    #[error(
        "region ({first_col},{first_row})-({last_col},{last_row}) exceeds area of {column_count} columns x {row_count} rows"
    )]
    RegionOutOfBounds {
        first_col: u32,
        first_row: u32,
        last_col: u32,
        last_row: u32,
        column_count: u32,
        row_count: u32,
    },

    #[error("row {row} is out of range (area has {row_count} rows)")]
    RowOutOfRange { row: u32, row_count: u32 },

    #[error("column {col} is out of range (area has {column_count} columns)")]
    ColumnOutOfRange { col: u32, column_count: u32 },

    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("grouping level {level} has no discriminator field; only the outermost level may omit it")]
    MissingDiscriminator { level: usize },

    #[error("style area of grouping level {level} has {rows} rows but the level reserves {row_height}")]
    StyleTallerThanLevel { level: usize, rows: u32, row_height: u32 },

    #[error("row offset {offset} moves the area past the last sheet row")]
    OffsetOverflow { offset: u32 },

    #[error("invalid report definition: {0}")]
    InvalidDefinition(String),
}
