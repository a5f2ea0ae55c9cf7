// ! Writer module propagating verification changes back into the spreadsheet

mod xlsx_writer;

pub use xlsx_writer::{Highlight, ensure_writable, save_workbook_xlsx};

use std::collections::BTreeMap;
use std::path::Path;

use crate::classifier::{Classification, classify};
use crate::config::ColorConfig;
use crate::error::{Result, ReviewError};
use crate::import::required_text;
use crate::model::{DISPLAY_DATE_FORMAT, parse_review_date};
use crate::reader::{self, CellValue, xml_parser};

/// Header given to the verified column when the sheet has none
pub const VERIFIED_HEADER: &str = "Verified";

/// Everything needed to rewrite one spreadsheet after a toggle
#[derive(Debug, Clone, Copy)]
pub struct WriteBack<'a> {
    pub path: &'a Path,
    pub sheet: Option<&'a str>,
    /// Classification recorded at import time
    pub expected: &'a Classification,
    pub colors: &'a ColorConfig,
}

impl WriteBack<'_> {
    /// Set the verified cell of every row with `reference` and rewrite the file.
    ///
    /// Returns how many rows matched.
    pub fn apply(&self, reference: &str, verified: bool) -> Result<usize> {
        let path = self.path;
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => {}
            _ => return Err(ReviewError::UnsupportedFormat(path.to_path_buf())),
        }

        // A missing file is left to the re-read, which reports it as unreadable
        if path.exists() {
            ensure_writable(path)?;
        }

        let mut workbook = reader::read_workbook(path)?;
        let index = workbook.table_index(self.sheet).ok_or_else(|| {
            ReviewError::ClassificationDrift {
                path: path.to_path_buf(),
                reason: format!("sheet '{}' is gone", self.sheet.unwrap_or("<first>")),
            }
        })?;
        let table = &mut workbook.tables[index];

        // Same heuristic as import, on the file as it is now
        let current = classify(table).map_err(|e| ReviewError::ClassificationDrift {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(reason) = self.expected.layout_mismatch(&current) {
            return Err(ReviewError::ClassificationDrift {
                path: path.to_path_buf(),
                reason,
            });
        }

        let required = [
            current.product_name.index,
            current.reference.index,
            current.review_date.index,
        ];
        let existing = table.columns.iter().enumerate().position(|(i, c)| {
            !required.contains(&i) && c.trim().eq_ignore_ascii_case(VERIFIED_HEADER)
        });
        let verified_col = match (&current.verified, existing) {
            (Some(col), _) => col.index,
            // Header present but no 0/1 values yet
            (None, Some(index)) => {
                for row in &mut table.rows {
                    if row[index].is_empty() {
                        row[index] = CellValue::Number(0.0);
                    }
                }
                index
            }
            (None, None) => {
                log::info!("adding '{}' column to {}", VERIFIED_HEADER, path.display());
                table.push_column(VERIFIED_HEADER, CellValue::Number(0.0))
            }
        };

        let flag = CellValue::Number(if verified { 1.0 } else { 0.0 });
        let mut matched = 0;
        for row in &mut table.rows {
            if required_text(row, current.reference.index).as_deref() == Some(reference) {
                row[verified_col] = flag.clone();
                matched += 1;
            }

            let date_cell = &mut row[current.review_date.index];
            if let Some(date) = parse_review_date(date_cell) {
                *date_cell = CellValue::Text(date.format(DISPLAY_DATE_FORMAT).to_string());
            }
        }

        save_workbook_xlsx(
            &workbook,
            path,
            Some(Highlight {
                table: index,
                column: verified_col,
                verified_rgb: self.colors.verified_rgb()?,
                unverified_rgb: self.colors.unverified_rgb()?,
            }),
        )?;

        log::info!(
            "wrote {} row(s) with reference '{}' as {} to {}",
            matched,
            reference,
            if verified { 1 } else { 0 },
            path.display()
        );
        Ok(matched)
    }
}

/// Fill color of each cell in `column` of a written sheet, keyed by 0-based row
pub fn verified_fills(path: &Path, sheet_index: usize, column: u32) -> Result<BTreeMap<u32, String>> {
    Ok(xml_parser::cell_fills(path, sheet_index)?
        .into_iter()
        .filter(|((_, col), _)| *col == column)
        .map(|((row, _), color)| (row, color))
        .collect())
}
