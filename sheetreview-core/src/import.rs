//! Conversion of a classified table into product rows

use crate::classifier::Classification;
use crate::error::{Result, ReviewError};
use crate::model::{ProductRow, parse_review_date};
use crate::reader::{CellValue, Table};

/// Product rows extracted from a table, plus how many data rows had no usable date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedRows {
    pub rows: Vec<ProductRow>,
    pub skipped: usize,
}

/// Convert every data row with a resolvable review date.
///
/// Rows without a date are skipped. A dated row without a product name or
/// reference aborts the whole conversion.
pub fn rows_from_table(table: &Table, classification: &Classification) -> Result<ImportedRows> {
    let mut imported = ImportedRows::default();

    for (idx, cells) in table.rows.iter().enumerate() {
        // Header occupies the first spreadsheet row
        let sheet_row = table.origin.0 as usize + idx + 2;

        let Some(review_date) = parse_review_date(&cells[classification.review_date.index])
        else {
            imported.skipped += 1;
            continue;
        };

        let product_name = required_text(cells, classification.product_name.index)
            .ok_or_else(|| ReviewError::InvalidRow {
                row: sheet_row,
                reason: format!("'{}' is empty", classification.product_name.name),
            })?;
        let reference = required_text(cells, classification.reference.index).ok_or_else(|| {
            ReviewError::InvalidRow {
                row: sheet_row,
                reason: format!("'{}' is empty", classification.reference.name),
            }
        })?;

        let verified = classification
            .verified
            .as_ref()
            .and_then(|col| cells[col.index].as_number())
            .is_some_and(|n| n == 1.0);

        imported.rows.push(ProductRow {
            product_name,
            reference,
            review_date,
            verified,
        });
    }

    if imported.skipped > 0 {
        log::warn!(
            "skipped {} row(s) of sheet '{}' without a readable review date",
            imported.skipped,
            table.sheet
        );
    }

    Ok(imported)
}

/// Cell rendered as trimmed text, `None` when blank
pub(crate) fn required_text(cells: &[CellValue], index: usize) -> Option<String> {
    let cell = cells.get(index)?;
    if cell.is_empty() {
        return None;
    }
    Some(cell.to_string().trim().to_string())
}
