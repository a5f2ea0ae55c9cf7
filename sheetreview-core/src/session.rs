//! Session context and command dispatch
//!
//! A [`Session`] owns the review store and remembers the active spreadsheet
//! (the last successful import). Front ends turn user actions into a
//! [`Command`] and hand it to [`Session::dispatch`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::{Classification, classify};
use crate::config::ReviewConfig;
use crate::error::{Result, ReviewError};
use crate::import::rows_from_table;
use crate::model::{MonthFilter, StoredProduct};
use crate::reader;
use crate::store::ReviewStore;
use crate::writer::WriteBack;

pub const SESSION_FILE: &str = "session.toml";

/// The spreadsheet the store was last imported from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSpreadsheet {
    pub path: PathBuf,
    /// Sheet name the rows came from
    pub sheet: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import { path: PathBuf },
    Query { month: MonthFilter },
    ToggleVerified { reference: String, verified: bool },
}

#[derive(Debug)]
pub enum Outcome {
    Imported(ImportReport),
    Rows(Vec<StoredProduct>),
    Toggled(ToggleReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub path: PathBuf,
    pub sheet: String,
    pub classification: Classification,
    pub imported: usize,
    pub skipped: usize,
}

/// Result of a toggle: the store update always stands once this exists
#[derive(Debug)]
pub struct ToggleReport {
    pub reference: String,
    pub verified: bool,
    /// Rows changed in the store
    pub updated: usize,
    /// Spreadsheet rows rewritten, or why the spreadsheet was not updated
    pub write_back: Result<usize>,
}

impl ToggleReport {
    /// Store and spreadsheet disagree until the next successful write-back
    pub fn diverged(&self) -> bool {
        self.write_back.is_err()
    }
}

pub struct Session {
    config: ReviewConfig,
    store: ReviewStore,
    active: Option<ActiveSpreadsheet>,
    /// Where the active spreadsheet is persisted; `None` keeps it in memory only
    session_file: Option<PathBuf>,
}

impl Session {
    /// Open the store and restore the active spreadsheet from the data directory
    pub fn open(config: ReviewConfig) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store = ReviewStore::open(&config.database_path()?)?;
        let session_file = data_dir.join(SESSION_FILE);
        let active = load_active(&session_file);
        Ok(Self {
            config,
            store,
            active,
            session_file: Some(session_file),
        })
    }

    /// Session over an existing store that remembers nothing on disk
    pub fn with_store(config: ReviewConfig, store: ReviewStore) -> Self {
        Self {
            config,
            store,
            active: None,
            session_file: None,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn active(&self) -> Option<&ActiveSpreadsheet> {
        self.active.as_ref()
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Import { path } => self.import(&path).map(Outcome::Imported),
            Command::Query { month } => self.store.query(month).map(Outcome::Rows),
            Command::ToggleVerified {
                reference,
                verified,
            } => self.toggle_verified(&reference, verified).map(Outcome::Toggled),
        }
    }

    /// Read, classify and convert `path`, then replace the store contents
    pub fn import(&mut self, path: &Path) -> Result<ImportReport> {
        let table = reader::read_table(path, self.config.sheet.as_deref())?;
        let classification = classify(&table)?;
        let imported = rows_from_table(&table, &classification)?;
        let count = self.store.replace_all(&imported.rows)?;

        let active = ActiveSpreadsheet {
            path: path.to_path_buf(),
            sheet: table.sheet.clone(),
            classification: classification.clone(),
        };
        self.remember(active);

        log::info!("imported {} row(s) from {}", count, path.display());
        Ok(ImportReport {
            path: path.to_path_buf(),
            sheet: table.sheet,
            classification,
            imported: count,
            skipped: imported.skipped,
        })
    }

    /// Update the store, then propagate the change to the active spreadsheet.
    ///
    /// Only a store failure is an error here; a failed write-back is logged
    /// and reported inside the returned [`ToggleReport`].
    pub fn toggle_verified(&mut self, reference: &str, verified: bool) -> Result<ToggleReport> {
        let updated = self.store.update_verified(reference, verified)?;

        let write_back = match &self.active {
            Some(active) => WriteBack {
                path: &active.path,
                sheet: Some(&active.sheet),
                expected: &active.classification,
                colors: &self.config.colors,
            }
            .apply(reference, verified),
            None => Err(ReviewError::NoActiveSpreadsheet),
        };

        if let Err(e) = &write_back {
            log::error!(
                "store updated but spreadsheet not written back for '{}': {}",
                reference,
                e
            );
        }

        Ok(ToggleReport {
            reference: reference.to_string(),
            verified,
            updated,
            write_back,
        })
    }

    fn remember(&mut self, active: ActiveSpreadsheet) {
        if let Some(file) = &self.session_file {
            if let Err(e) = save_active(file, &active) {
                log::warn!("could not persist session to {}: {}", file.display(), e);
            }
        }
        self.active = Some(active);
    }
}

fn load_active(file: &Path) -> Option<ActiveSpreadsheet> {
    let content = fs::read_to_string(file).ok()?;
    match toml::from_str(&content) {
        Ok(active) => Some(active),
        Err(e) => {
            log::warn!("ignoring unreadable session file {}: {}", file.display(), e);
            None
        }
    }
}

fn save_active(file: &Path, active: &ActiveSpreadsheet) -> std::result::Result<(), String> {
    let content = toml::to_string(active).map_err(|e| e.to_string())?;
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(file, content).map_err(|e| e.to_string())
}
