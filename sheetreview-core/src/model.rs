//! Product rows, month filters and review-date parsing

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::reader::CellValue;

/// Display format for review dates written back to the spreadsheet
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Day-first formats accepted for text date cells, tried in order.
///
/// Two-digit years come first: `%y` rejects a four-digit year, while `%Y`
/// would read `24` as the year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d",
];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One imported product awaiting review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_name: String,
    pub reference: String,
    pub review_date: NaiveDate,
    pub verified: bool,
}

/// A product row as held by the review store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub product_id: i64,
    #[serde(flatten)]
    pub row: ProductRow,
}

/// Interpret a cell as a day/month/year date
pub fn parse_review_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .filter(|date| date.year() >= MIN_FULL_YEAR)
}

/// Years below this only come from truncated years such as `024`
const MIN_FULL_YEAR: i32 = 1000;

/// Month selection for queries: everything, or one calendar month of any year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    /// Calendar month, 1-12
    Month(u32),
}

impl MonthFilter {
    /// Current month on the local clock
    pub fn current() -> Self {
        MonthFilter::Month(chrono::Local::now().month())
    }

    pub fn month(&self) -> Option<u32> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(m) => Some(*m),
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(m) => date.month() == *m,
        }
    }

    /// The thirteen selector options: "All" followed by the month names
    pub fn options() -> Vec<MonthFilter> {
        std::iter::once(MonthFilter::All)
            .chain((1..=12).map(MonthFilter::Month))
            .collect()
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("All"),
            MonthFilter::Month(m) => match m.checked_sub(1).and_then(|i| MONTH_NAMES.get(i as usize)) {
                Some(name) => f.write_str(name),
                None => write!(f, "Month {}", m),
            },
        }
    }
}

impl FromStr for MonthFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "all" {
            return Ok(MonthFilter::All);
        }
        if let Ok(n) = lower.parse::<u32>() {
            return if (1..=12).contains(&n) {
                Ok(MonthFilter::Month(n))
            } else {
                Err(format!("month number out of range: {}", n))
            };
        }
        MONTH_NAMES
            .iter()
            .position(|name| {
                let name = name.to_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .map(|idx| MonthFilter::Month(idx as u32 + 1))
            .ok_or_else(|| format!("unknown month: {}", s))
    }
}
