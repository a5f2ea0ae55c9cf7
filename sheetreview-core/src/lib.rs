//! sheetreview-core: Core library for product review spreadsheets
//!
//! This library imports product review rows from Excel/ODS files into a
//! local SQLite store, filters them by review month, and writes verification
//! changes back into the source spreadsheet with colored fills.

pub mod classifier;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod reader;
pub mod session;
pub mod store;
pub mod writer;

pub use classifier::{Classification, ColumnRef, Role, classify};
pub use config::ReviewConfig;
pub use error::{Result, ReviewError};
pub use model::{MonthFilter, ProductRow, StoredProduct};
pub use session::{ActiveSpreadsheet, Command, ImportReport, Outcome, Session, ToggleReport};
pub use store::ReviewStore;
pub use writer::{WriteBack, verified_fills};
