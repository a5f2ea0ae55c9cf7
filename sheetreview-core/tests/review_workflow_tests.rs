use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use sheetreview_core::reader::{self, CellValue};
use sheetreview_core::{
    Command, MonthFilter, Outcome, ReviewConfig, ReviewError, ReviewStore, Role, Session, classify,
    verified_fills,
};
use std::path::{Path, PathBuf};

type Row<'a> = (&'a str, &'a str, &'a str, Option<f64>);

const SCENARIO: &[Row<'static>] = &[
    ("Widget A", "REF1", "01/03/2024", None),
    ("Widget B", "REF2", "15/03/2024", Some(1.0)),
];

// Helper to write a product sheet plus an unrelated second sheet
fn create_products_xlsx(path: &Path, headers: [&str; 4], rows: &[Row]) -> anyhow::Result<()> {
    let mut workbook = XlsxWorkbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Products")?;
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (i, (name, reference, date, verified)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        // Empty strings stay blank cells
        for (col, text) in [*name, *reference, *date].into_iter().enumerate() {
            if !text.is_empty() {
                sheet.write_string(row, col as u16, text)?;
            }
        }
        if let Some(v) = verified {
            sheet.write_number(row, 3, *v)?;
        }
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes")?;
    notes.write_string(0, 0, "Checked by")?;
    notes.write_string(1, 0, "Quality team")?;

    workbook.save(path)?;
    Ok(())
}

const HEADERS: [&str; 4] = ["Product Name", "Reference", "Review Date", "Verified"];

fn scenario_file(dir: &Path) -> PathBuf {
    let path = dir.join("products.xlsx");
    create_products_xlsx(&path, HEADERS, SCENARIO).unwrap();
    path
}

fn memory_session() -> Session {
    Session::with_store(ReviewConfig::default(), ReviewStore::open_in_memory().unwrap())
}

fn verified_flags(session: &mut Session, month: MonthFilter) -> Vec<bool> {
    match session.dispatch(Command::Query { month }).unwrap() {
        Outcome::Rows(rows) => rows.iter().map(|p| p.row.verified).collect(),
        other => panic!("expected rows, got {:?}", other),
    }
}

fn data_at(path: &Path, sheet: &str, row: u32, col: u32) -> Data {
    let mut workbook = open_workbook_auto(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

#[test]
fn test_import_query_toggle_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();

    match session.dispatch(Command::Import { path: path.clone() }).unwrap() {
        Outcome::Imported(report) => {
            assert_eq!(report.imported, 2);
            assert_eq!(report.skipped, 0);
            assert_eq!(report.sheet, "Products");
            assert_eq!(report.classification.product_name.name, "Product Name");
            assert_eq!(report.classification.reference.name, "Reference");
            assert_eq!(report.classification.review_date.name, "Review Date");
            assert_eq!(
                report.classification.verified.as_ref().map(|c| c.name.as_str()),
                Some("Verified")
            );
        }
        other => panic!("expected import report, got {:?}", other),
    }

    assert_eq!(verified_flags(&mut session, MonthFilter::Month(3)), [false, true]);
    assert!(verified_flags(&mut session, MonthFilter::Month(4)).is_empty());

    let outcome = session
        .dispatch(Command::ToggleVerified {
            reference: "REF1".to_string(),
            verified: true,
        })
        .unwrap();
    let Outcome::Toggled(report) = outcome else {
        panic!("expected toggle report");
    };
    assert_eq!(report.updated, 1);
    assert_eq!(report.write_back.unwrap(), 1);

    assert_eq!(verified_flags(&mut session, MonthFilter::All), [true, true]);
}

#[test]
fn test_write_back_sets_value_and_fill() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();
    session.import(&path).unwrap();

    let report = session.toggle_verified("REF1", true).unwrap();
    assert!(!report.diverged());
    let report = session.toggle_verified("REF2", false).unwrap();
    assert!(!report.diverged());

    assert_eq!(data_at(&path, "Products", 1, 3), Data::Float(1.0));
    assert_eq!(data_at(&path, "Products", 2, 3), Data::Float(0.0));
    // Dates are rewritten as day/month/year text
    assert_eq!(
        data_at(&path, "Products", 1, 2),
        Data::String("01/03/2024".to_string())
    );

    let fills = verified_fills(&path, 0, 3).unwrap();
    assert_eq!(fills.get(&1).map(String::as_str), Some("00FF00"));
    assert_eq!(fills.get(&2).map(String::as_str), Some("FF0000"));
    assert!(!fills.contains_key(&0));
}

#[test]
fn test_write_back_preserves_other_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();
    session.import(&path).unwrap();
    session.toggle_verified("REF1", true).unwrap();

    let workbook = reader::read_workbook(&path).unwrap();
    let names: Vec<&str> = workbook.tables.iter().map(|t| t.sheet.as_str()).collect();
    assert_eq!(names, ["Products", "Notes"]);
    let notes = workbook.get_table("Notes").unwrap();
    assert_eq!(notes.columns, ["Checked by"]);
    assert_eq!(notes.rows[0][0], CellValue::Text("Quality team".to_string()));
}

#[test]
fn test_write_back_appends_verified_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_flags.xlsx");
    let rows: &[Row] = &[
        ("Widget A", "REF1", "01/03/2024", None),
        ("Widget B", "REF2", "15/03/2024", None),
    ];
    create_products_xlsx(&path, HEADERS, rows).unwrap();

    let mut session = memory_session();
    let report = session.import(&path).unwrap();
    assert_eq!(report.classification.verified, None);

    let toggled = session.toggle_verified("REF2", true).unwrap();
    assert_eq!(toggled.write_back.unwrap(), 1);

    let table = reader::read_table(&path, Some("Products")).unwrap();
    let col = table.column_index("Verified").unwrap();
    assert_eq!(table.rows[0][col], CellValue::Number(0.0));
    assert_eq!(table.rows[1][col], CellValue::Number(1.0));

    // The rewritten file still classifies the same way
    let again = classify(&table).unwrap();
    assert!(report.classification.layout_mismatch(&again).is_none());
}

#[test]
fn test_duplicate_references_are_all_updated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dupes.xlsx");
    let rows: &[Row] = &[
        ("Widget A", "REF1", "01/03/2024", Some(0.0)),
        ("Widget A v2", "REF1", "02/03/2024", Some(0.0)),
        ("Widget B", "REF2", "03/03/2024", Some(0.0)),
    ];
    create_products_xlsx(&path, HEADERS, rows).unwrap();

    let mut session = memory_session();
    session.import(&path).unwrap();
    let report = session.toggle_verified("REF1", true).unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(report.write_back.unwrap(), 2);

    assert_eq!(
        verified_flags(&mut session, MonthFilter::All),
        [true, true, false]
    );
    let fills = verified_fills(&path, 0, 3).unwrap();
    assert_eq!(fills.values().filter(|c| *c == "00FF00").count(), 2);
}

#[test]
fn test_rows_without_dates_are_not_imported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.xlsx");
    let rows: &[Row] = &[
        ("Widget A", "REF1", "01/03/2024", None),
        ("Widget B", "REF2", "not reviewed", None),
        ("Widget C", "REF3", "20/05/2024", None),
        ("Widget D", "REF4", "31/05/2024", None),
    ];
    create_products_xlsx(&path, HEADERS, rows).unwrap();

    let mut session = memory_session();
    let report = session.import(&path).unwrap();
    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(session.store().count().unwrap(), 3);
}

#[test]
fn test_classification_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let table = reader::read_table(&path, None).unwrap();
    assert_eq!(classify(&table).unwrap(), classify(&table).unwrap());
}

#[test]
fn test_drift_keeps_store_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();
    session.import(&path).unwrap();

    // Someone renames the reference header after import
    create_products_xlsx(
        &path,
        ["Product Name", "Code", "Review Date", "Verified"],
        SCENARIO,
    )
    .unwrap();

    let report = session.toggle_verified("REF1", true).unwrap();
    assert_eq!(report.updated, 1);
    assert!(matches!(
        report.write_back,
        Err(ReviewError::ClassificationDrift { .. })
    ));
    assert_eq!(verified_flags(&mut session, MonthFilter::All), [true, true]);
    // The file is left as it was
    assert_eq!(data_at(&path, "Products", 1, 3), Data::Empty);
}

#[test]
fn test_write_back_requires_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xlsm");
    create_products_xlsx(&path, HEADERS, SCENARIO).unwrap();

    let mut session = memory_session();
    session.import(&path).unwrap();
    let report = session.toggle_verified("REF1", true).unwrap();
    assert!(matches!(
        report.write_back,
        Err(ReviewError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_import_without_reference_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_refs.xlsx");
    let rows: &[Row] = &[
        ("Widget A", "REF-1", "01/03/2024", None),
        ("Widget B", "REF-2", "15/03/2024", None),
    ];
    create_products_xlsx(&path, HEADERS, rows).unwrap();

    let mut session = memory_session();
    let err = session.import(&path).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::MissingRequiredColumn(Role::Reference)
    ));
    assert_eq!(session.store().count().unwrap(), 0);
    assert!(session.active().is_none());
}

#[test]
fn test_import_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = memory_session();
    let err = session.import(&dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, ReviewError::UnreadableFile { .. }));
}

#[test]
fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let config = ReviewConfig {
        data_dir: Some(dir.path().join("data")),
        ..ReviewConfig::default()
    };

    {
        let mut session = Session::open(config.clone()).unwrap();
        session.import(&path).unwrap();
    }

    let mut session = Session::open(config).unwrap();
    assert_eq!(session.active().map(|a| a.path.clone()), Some(path.clone()));
    let report = session.toggle_verified("REF1", true).unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.write_back.unwrap(), 1);
    assert_eq!(data_at(&path, "Products", 1, 3), Data::Float(1.0));
}

#[test]
fn test_two_digit_years_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short_years.xlsx");
    let rows: &[Row] = &[
        ("Widget A", "REF1", "01/03/24", None),
        ("Widget B", "REF2", "15/03/24", Some(1.0)),
    ];
    create_products_xlsx(&path, HEADERS, rows).unwrap();

    let mut session = memory_session();
    session.import(&path).unwrap();
    let march = match session
        .dispatch(Command::Query {
            month: MonthFilter::Month(3),
        })
        .unwrap()
    {
        Outcome::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    };
    let dates: Vec<String> = march
        .iter()
        .map(|p| p.row.review_date.to_string())
        .collect();
    assert_eq!(dates, ["2024-03-01", "2024-03-15"]);

    let report = session.toggle_verified("REF1", true).unwrap();
    assert_eq!(report.write_back.unwrap(), 1);
    assert_eq!(
        data_at(&path, "Products", 1, 2),
        Data::String("01/03/2024".to_string())
    );
    assert_eq!(
        data_at(&path, "Products", 2, 2),
        Data::String("15/03/2024".to_string())
    );
}

#[test]
fn test_failed_import_keeps_previous_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();
    session.import(&path).unwrap();
    session.toggle_verified("REF1", true).unwrap();

    let broken = dir.path().join("broken.xlsx");
    let rows: &[Row] = &[
        ("Widget C", "REF3", "01/04/2024", None),
        ("Widget D", "", "02/04/2024", None),
    ];
    create_products_xlsx(&broken, HEADERS, rows).unwrap();

    let err = session.import(&broken).unwrap_err();
    assert!(matches!(err, ReviewError::InvalidRow { row: 3, .. }));

    let stored = match session
        .dispatch(Command::Query {
            month: MonthFilter::All,
        })
        .unwrap()
    {
        Outcome::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    };
    let refs: Vec<&str> = stored.iter().map(|p| p.row.reference.as_str()).collect();
    assert_eq!(refs, ["REF1", "REF2"]);
    assert_eq!(verified_flags(&mut session, MonthFilter::All), [true, true]);
    assert_eq!(session.active().map(|a| a.path.clone()), Some(path));
}

#[test]
fn test_unwritable_target_keeps_store_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = scenario_file(dir.path());
    let mut session = memory_session();
    session.import(&path).unwrap();

    // A directory now sits where the spreadsheet was
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let report = session.toggle_verified("REF1", true).unwrap();
    assert_eq!(report.updated, 1);
    assert!(matches!(
        report.write_back,
        Err(ReviewError::WriteConflict { .. })
    ));
    assert_eq!(verified_flags(&mut session, MonthFilter::All), [true, true]);
    assert!(path.is_dir());
}
