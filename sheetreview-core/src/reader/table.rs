//! In-memory table data structures

use chrono::NaiveDateTime;
use std::fmt;
use std::path::PathBuf;

/// All sheets of a workbook, in workbook order
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub path: PathBuf,
    pub tables: Vec<Table>,
}

impl Workbook {
    /// Get a table by sheet name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.sheet == name)
    }

    /// Index of the table matching `sheet`, or the first table when `sheet` is `None`
    pub fn table_index(&self, sheet: Option<&str>) -> Option<usize> {
        match sheet {
            Some(name) => self.tables.iter().position(|t| t.sheet == name),
            None if self.tables.is_empty() => None,
            None => Some(0),
        }
    }
}

/// One worksheet read as a header row plus data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub sheet: String,
    /// (row, col) of the header's first cell in the worksheet, 0-based
    pub origin: (u32, u32),
    pub columns: Vec<String>,
    /// Data rows; every row has exactly `columns.len()` cells
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table from a header row and data rows, padding short rows
    pub fn new(sheet: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self {
            sheet: sheet.into(),
            origin: (0, 0),
            columns,
            rows,
        }
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(col))
    }

    /// Index of the column with the given header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Append a column, filling every existing row with `fill`
    pub fn push_column(&mut self, name: impl Into<String>, fill: CellValue) -> usize {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        self.columns.len() - 1
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty (blank text counts as empty)
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the cell; booleans count as 0/1
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // Integral floats print without the trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_numbers() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_new_pads_rows() {
        let table = Table::new(
            "Sheet1",
            vec!["A".into(), "B".into()],
            vec![vec![CellValue::Number(1.0)]],
        );
        assert_eq!(table.rows[0], vec![CellValue::Number(1.0), CellValue::Empty]);
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(CellValue::Text("   ".into()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }
}
