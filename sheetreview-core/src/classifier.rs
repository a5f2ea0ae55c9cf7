//! Column role inference
//!
//! Spreadsheet headers vary from one import to the next, so roles are assigned
//! by looking at cell contents. Roles are resolved first-match-wins in a fixed
//! order (product name, reference, verified, review date) and a column claimed
//! by an earlier role is not offered to later ones. Import and write-back both
//! go through [`classify`] so they always agree on the layout.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Result, ReviewError};
use crate::model::parse_review_date;
use crate::reader::{CellValue, Table};

/// A product name column must have a cell longer than this many characters
pub const PRODUCT_NAME_MIN_LEN: usize = 5;

/// A date column must parse for more than this share of its non-missing cells
pub const DATE_PARSE_THRESHOLD: f64 = 0.5;

fn reference_pattern() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    ProductName,
    Reference,
    Verified,
    ReviewDate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::ProductName => "product name",
            Role::Reference => "reference",
            Role::Verified => "verified",
            Role::ReviewDate => "review date",
        };
        f.write_str(name)
    }
}

/// A classified column: position in the table and its header text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

/// Mapping from semantic role to table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub product_name: ColumnRef,
    pub reference: ColumnRef,
    pub review_date: ColumnRef,
    /// Absent when no 0/1 column exists; every row then counts as unverified
    pub verified: Option<ColumnRef>,
}

impl Classification {
    /// Compare required roles by header; returns a description of the first mismatch
    pub fn layout_mismatch(&self, other: &Classification) -> Option<String> {
        let pairs = [
            (Role::ProductName, &self.product_name, &other.product_name),
            (Role::Reference, &self.reference, &other.reference),
            (Role::ReviewDate, &self.review_date, &other.review_date),
        ];
        pairs
            .into_iter()
            .find(|(_, a, b)| a.name != b.name)
            .map(|(role, a, b)| {
                format!("{} column was '{}', now '{}'", role, a.name, b.name)
            })
    }
}

/// Assign roles to the columns of `table`
pub fn classify(table: &Table) -> Result<Classification> {
    let mut claimed = vec![false; table.width()];

    let product_name = claim(table, &mut claimed, Role::ProductName, is_product_name_column);
    let reference = claim(table, &mut claimed, Role::Reference, is_reference_column);
    let verified = claim(table, &mut claimed, Role::Verified, is_verified_column);
    let review_date = claim(table, &mut claimed, Role::ReviewDate, is_date_column);

    Ok(Classification {
        product_name: product_name.ok_or(ReviewError::MissingRequiredColumn(Role::ProductName))?,
        reference: reference.ok_or(ReviewError::MissingRequiredColumn(Role::Reference))?,
        review_date: review_date.ok_or(ReviewError::MissingRequiredColumn(Role::ReviewDate))?,
        verified,
    })
}

fn claim(
    table: &Table,
    claimed: &mut [bool],
    role: Role,
    test: fn(&[&CellValue]) -> bool,
) -> Option<ColumnRef> {
    for (index, name) in table.columns.iter().enumerate() {
        if claimed[index] {
            continue;
        }
        let cells: Vec<&CellValue> = table.column(index).filter(|c| !c.is_empty()).collect();
        if test(&cells) {
            claimed[index] = true;
            log::debug!("classified column '{}' as {}", name, role);
            return Some(ColumnRef {
                index,
                name: name.clone(),
            });
        }
    }
    log::debug!("no column classified as {}", role);
    None
}

/// Non-empty and every present cell is text
fn is_text_column(cells: &[&CellValue]) -> bool {
    !cells.is_empty() && cells.iter().all(|c| matches!(c, CellValue::Text(_)))
}

fn is_product_name_column(cells: &[&CellValue]) -> bool {
    is_text_column(cells)
        && cells
            .iter()
            .filter_map(|c| c.as_text())
            .map(|s| s.chars().count())
            .max()
            .is_some_and(|len| len > PRODUCT_NAME_MIN_LEN)
}

fn is_reference_column(cells: &[&CellValue]) -> bool {
    is_text_column(cells)
        && cells
            .iter()
            .filter_map(|c| c.as_text())
            .any(|s| reference_pattern().is_match(s))
}

fn is_verified_column(cells: &[&CellValue]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| matches!(c.as_number(), Some(n) if n == 0.0 || n == 1.0))
}

fn is_date_column(cells: &[&CellValue]) -> bool {
    if cells.is_empty() {
        return false;
    }
    let parsed = cells
        .iter()
        .filter(|c| parse_review_date(c).is_some())
        .count();
    parsed as f64 / cells.len() as f64 > DATE_PARSE_THRESHOLD
}
