//! SQLite-backed review store
//!
//! One table of product rows, replaced wholesale on every import. The only
//! in-place mutation is the `verified` flag.

use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, params};
use std::path::{Path, PathBuf};

use crate::error::{Result, ReviewError};
use crate::model::{MonthFilter, ProductRow, StoredProduct};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS products (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT NOT NULL,
    reference TEXT NOT NULL,
    review_date TEXT NOT NULL,
    verified INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_products_reference ON products(reference);";

const ISO_DATE: &str = "%Y-%m-%d";

pub struct ReviewStore {
    conn: Connection,
    path: PathBuf,
}

impl ReviewStore {
    /// Open (creating if needed) the store file and its parent directory
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| ReviewError::StoreUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| unavailable(e.to_string()))?;

        log::debug!("opened review store at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ReviewError::StoreUnavailable {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard every stored row and insert `rows`, all in one transaction
    pub fn replace_all(&mut self, rows: &[ProductRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM products", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (product_name, reference, review_date, verified)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (idx, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    row.product_name,
                    row.reference,
                    row.review_date.format(ISO_DATE).to_string(),
                    row.verified,
                ])
                .map_err(|e| constraint_to_invalid_row(e, idx))?;
            }
        }
        // Dropping `tx` on an early return rolls everything back
        tx.commit()?;
        log::info!("review store replaced with {} row(s)", rows.len());
        Ok(rows.len())
    }

    /// Set `verified` on every row with this reference; returns how many changed
    pub fn update_verified(&self, reference: &str, verified: bool) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE products SET verified = ?1 WHERE reference = ?2",
            params![verified, reference],
        )?;
        if updated == 0 {
            log::warn!("no stored row has reference '{}'", reference);
        }
        Ok(updated)
    }

    /// Rows in insertion order, optionally limited to one calendar month
    pub fn query(&self, filter: MonthFilter) -> Result<Vec<StoredProduct>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, product_name, reference, review_date, verified
             FROM products
             WHERE ?1 IS NULL OR CAST(strftime('%m', review_date) AS INTEGER) = ?1
             ORDER BY product_id",
        )?;
        let rows = stmt
            .query_map(params![filter.month()], |row| {
                let date: String = row.get(3)?;
                let review_date = NaiveDate::parse_from_str(&date, ISO_DATE).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(StoredProduct {
                    product_id: row.get(0)?,
                    row: ProductRow {
                        product_name: row.get(1)?,
                        reference: row.get(2)?,
                        review_date,
                        verified: row.get(4)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn constraint_to_invalid_row(err: rusqlite::Error, idx: usize) -> ReviewError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ReviewError::InvalidRow {
            row: idx + 1,
            reason: err.to_string(),
        },
        _ => ReviewError::Sqlite(err),
    }
}
