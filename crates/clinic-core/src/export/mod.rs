//! Payment reports and their document, workbook and CSV exports.

mod document;
mod report;
mod spreadsheet;
mod workbook;

pub use document::*;
pub use report::*;
pub use spreadsheet::*;
pub use workbook::*;

use thiserror::Error;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Malformed export: {0}")]
    Malformed(String),
}

pub type ExportResult<T> = Result<T, ExportError>;
