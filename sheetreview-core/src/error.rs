//! Error taxonomy for import, store and write-back operations

use std::path::PathBuf;
use thiserror::Error;

use crate::classifier::Role;

pub type Result<T> = std::result::Result<T, ReviewError>;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The spreadsheet is missing, not a spreadsheet, or locked by another process
    #[error("cannot read spreadsheet {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("no column could be classified as {0}")]
    MissingRequiredColumn(Role),

    /// The spreadsheet no longer classifies the way it did at import time
    #[error("column layout of {} changed since import: {reason}", path.display())]
    ClassificationDrift { path: PathBuf, reason: String },

    /// `row` is the 1-based spreadsheet row (header is row 1)
    #[error("row {row} is invalid: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("review store at {} is unavailable: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("cannot write {}, is it open in another program? ({reason})", path.display())]
    WriteConflict { path: PathBuf, reason: String },

    #[error("{} cannot be written back, only .xlsx files are supported", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("cannot build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// A toggle was requested before any spreadsheet was imported
    #[error("no spreadsheet has been imported yet")]
    NoActiveSpreadsheet,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl ReviewError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReviewError::UnreadableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_conflict(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReviewError::WriteConflict {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
