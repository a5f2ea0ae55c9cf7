//! Excel/ODS file reader using calamine

use calamine::{Data, DataType, Range, Reader, Sheets, open_workbook_auto};
use std::path::Path;

pub mod table;
pub mod xml_parser;

pub use table::{CellValue, Table, Workbook};

use crate::error::{Result, ReviewError};

/// Read every worksheet of a workbook into tables
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReviewError::unreadable(path, "file does not exist"));
    }

    // Locked or corrupt containers both surface here
    let mut excel: Sheets<_> =
        open_workbook_auto(path).map_err(|e| ReviewError::unreadable(path, e))?;

    let mut tables = Vec::new();
    for sheet_name in excel.sheet_names() {
        let range = excel
            .worksheet_range(&sheet_name)
            .map_err(|e| ReviewError::unreadable(path, format!("sheet '{}': {}", sheet_name, e)))?;
        tables.push(parse_table(&sheet_name, &range));
    }

    log::debug!("read {} sheet(s) from {}", tables.len(), path.display());

    Ok(Workbook {
        path: path.to_path_buf(),
        tables,
    })
}

/// Read one worksheet (the first one when `sheet` is `None`)
pub fn read_table<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = read_workbook(path)?;
    let index = workbook.table_index(sheet).ok_or_else(|| match sheet {
        Some(name) => ReviewError::unreadable(path, format!("no sheet named '{}'", name)),
        None => ReviewError::unreadable(path, "workbook has no sheets"),
    })?;
    Ok(workbook.tables.swap_remove(index))
}

/// First row of the used range is the header; the rest are data rows
fn parse_table(name: &str, range: &Range<Data>) -> Table {
    let origin = range.start().unwrap_or((0, 0));
    let mut rows = range.rows();

    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, data)| {
                let name = parse_cell_value(data).to_string().trim().to_string();
                if name.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    name
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let data_rows = rows
        .map(|row| row.iter().map(parse_cell_value).collect())
        .collect();

    let mut table = Table::new(name, columns, data_rows);
    table.origin = origin;
    table
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => match data.as_datetime() {
            Some(parsed) => CellValue::DateTime(parsed),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match data.as_datetime() {
            Some(parsed) => CellValue::DateTime(parsed),
            None => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
