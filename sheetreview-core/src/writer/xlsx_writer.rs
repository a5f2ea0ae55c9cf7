// ! XLSX writer that rebuilds a workbook from tables and highlights verified cells

use chrono::Timelike;
use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook, Worksheet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ReviewError};
use crate::reader::{CellValue, Table, Workbook};

/// Fill colors applied to one column of one sheet
#[derive(Debug, Clone, Copy)]
pub struct Highlight {
    pub table: usize,
    pub column: usize,
    pub verified_rgb: u32,
    pub unverified_rgb: u32,
}

/// Fail with `WriteConflict` when another process holds the file or it is read-only
pub fn ensure_writable(path: &Path) -> Result<()> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| ReviewError::write_conflict(path, e))
}

/// Render every table and replace `output_path` with the result.
///
/// The workbook is built in memory and written to a temporary file next to
/// the target, which is then renamed over it, so a failed write never leaves
/// a truncated spreadsheet behind.
pub fn save_workbook_xlsx(
    workbook: &Workbook,
    output_path: &Path,
    highlight: Option<Highlight>,
) -> Result<()> {
    let mut xlsx = XlsxWorkbook::new();

    for (idx, table) in workbook.tables.iter().enumerate() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&table.sheet)?;
        let column = highlight.filter(|h| h.table == idx);
        write_table(worksheet, table, column)?;
    }

    let buffer = xlsx.save_to_buffer()?;

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".sheetreview")
        .suffix(".xlsx")
        .tempfile_in(dir)
        .map_err(|e| ReviewError::write_conflict(output_path, e))?;
    tmp.write_all(&buffer)
        .map_err(|e| ReviewError::write_conflict(output_path, e))?;
    tmp.persist(output_path)
        .map_err(|e| ReviewError::write_conflict(output_path, e.error))?;

    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    highlight: Option<Highlight>,
) -> Result<()> {
    let (row0, col0) = table.origin;
    let verified_fill = highlight.map(|h| Format::new().set_background_color(Color::RGB(h.verified_rgb)));
    let unverified_fill =
        highlight.map(|h| Format::new().set_background_color(Color::RGB(h.unverified_rgb)));

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(row0, col0 as u16 + col as u16, name)?;
    }

    for (r, cells) in table.rows.iter().enumerate() {
        let row = row0 + 1 + r as u32;
        for (c, cell) in cells.iter().enumerate() {
            let col = col0 as u16 + c as u16;

            let fill = match (highlight, cell.as_number()) {
                (Some(h), Some(n)) if h.column == c && n == 1.0 => verified_fill.as_ref(),
                (Some(h), Some(n)) if h.column == c && n == 0.0 => unverified_fill.as_ref(),
                _ => None,
            };

            write_cell(worksheet, row, col, cell, fill)?;
        }
    }

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    fill: Option<&Format>,
) -> Result<()> {
    let plain = Format::new();
    let format = fill.unwrap_or(&plain);

    match cell {
        CellValue::Empty => {
            if fill.is_some() {
                worksheet.write_blank(row, col, format)?;
            }
        }
        CellValue::Text(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        CellValue::Boolean(b) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        CellValue::DateTime(dt) => {
            let num_format = if dt.num_seconds_from_midnight() == 0 {
                "dd/mm/yyyy"
            } else {
                "dd/mm/yyyy hh:mm:ss"
            };
            let date_format = format.clone().set_num_format(num_format);
            worksheet.write_datetime_with_format(row, col, dt, &date_format)?;
        }
        CellValue::Error(e) => {
            worksheet.write_string_with_format(row, col, e, format)?;
        }
    }

    Ok(())
}
