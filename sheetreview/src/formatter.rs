//! Output formatters for stored products and command reports

use anyhow::Result;
use colored::*;
use sheetreview_core::model::DISPLAY_DATE_FORMAT;
use sheetreview_core::reader::Table;
use sheetreview_core::{
    ActiveSpreadsheet, Classification, ImportReport, MonthFilter, StoredProduct, ToggleReport,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Print stored products as an aligned table
pub fn print_human(month: MonthFilter, products: &[StoredProduct]) {
    println!("{}", format!("Reviews: {}", month).bold());
    println!();

    if products.is_empty() {
        println!("{}", "No products reviewed in this period".yellow());
        return;
    }

    let name_width = products
        .iter()
        .map(|p| p.row.product_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Product".len());
    let ref_width = products
        .iter()
        .map(|p| p.row.reference.chars().count())
        .max()
        .unwrap_or(0)
        .max("Reference".len());

    println!(
        "{:>4}  {:<name_width$}  {:<ref_width$}  {:<10}  {}",
        "ID".bold(),
        "Product".bold(),
        "Reference".bold(),
        "Reviewed".bold(),
        "Verified".bold(),
    );
    for product in products {
        let row = &product.row;
        let verified = if row.verified {
            "yes".green().bold()
        } else {
            "no".red()
        };
        println!(
            "{:>4}  {:<name_width$}  {:<ref_width$}  {:<10}  {}",
            product.product_id,
            row.product_name,
            row.reference.cyan(),
            row.review_date.format(DISPLAY_DATE_FORMAT).to_string(),
            verified,
        );
    }

    let verified_count = products.iter().filter(|p| p.row.verified).count();
    println!();
    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Products:".bold(), products.len());
    println!("  {} {}", "Verified:".green().bold(), verified_count);
    println!(
        "  {} {}",
        "Unverified:".red().bold(),
        products.len() - verified_count
    );
}

/// Print stored products in JSON format
pub fn print_json(month: MonthFilter, products: &[StoredProduct]) -> Result<()> {
    let output = serde_json::json!({
        "month": month.to_string(),
        "products": products,
        "summary": {
            "total": products.len(),
            "verified": products.iter().filter(|p| p.row.verified).count(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_import(report: &ImportReport) {
    println!(
        "{} {} row(s) from {} [{}]",
        "Imported".green().bold(),
        report.imported,
        report.path.display(),
        report.sheet.cyan()
    );
    if report.skipped > 0 {
        println!(
            "  {} {} row(s) without a review date",
            "Skipped".yellow().bold(),
            report.skipped
        );
    }
    print_roles(&report.classification, 1);
}

pub fn print_classification(file: &Path, sheet: &str, classification: &Classification) {
    println!(
        "{}",
        format!("Columns of {} [{}]:", file.display(), sheet).bold()
    );
    print_roles(classification, 1);
}

fn print_roles(classification: &Classification, indent: usize) {
    let indent_str = "  ".repeat(indent);
    let roles = [
        ("Product name", Some(&classification.product_name)),
        ("Reference", Some(&classification.reference)),
        ("Review date", Some(&classification.review_date)),
        ("Verified", classification.verified.as_ref()),
    ];
    for (role, column) in roles {
        match column {
            Some(col) => println!("{}{:<13} {}", indent_str, role, col.name.cyan()),
            None => println!("{}{:<13} {}", indent_str, role, "(none)".bright_black()),
        }
    }
}

pub fn print_toggle(report: &ToggleReport) {
    let state = if report.verified {
        "verified".green().bold()
    } else {
        "unverified".red().bold()
    };
    println!(
        "Marked {} row(s) with reference {} as {}",
        report.updated,
        report.reference.cyan(),
        state
    );
    if report.updated == 0 {
        println!("  {} no stored product has this reference", "WARN".yellow().bold());
    }

    match &report.write_back {
        Ok(rows) => println!("  {} {} spreadsheet row(s)", "Wrote".green(), rows),
        Err(e) => {
            println!("  {} {}", "ERROR".red().bold(), e);
            println!(
                "  {}",
                "The review store was updated but the spreadsheet was not".yellow()
            );
        }
    }
}

/// Print the active spreadsheet with each verified cell and its fill color
pub fn print_inspect(
    active: &ActiveSpreadsheet,
    table: &Table,
    current: &Classification,
    fills: &BTreeMap<u32, String>,
    stored: usize,
) {
    println!(
        "{} {} [{}]",
        "Active:".bold(),
        active.path.display(),
        active.sheet.cyan()
    );
    println!("{} {}", "Stored products:".bold(), stored);
    print_roles(current, 1);
    println!();

    let Some(verified) = &current.verified else {
        println!("{}", "No verified column yet".yellow());
        return;
    };

    for (r, cells) in table.rows.iter().enumerate() {
        let sheet_row = table.origin.0 + 1 + r as u32;
        let reference = &cells[current.reference.index];
        let value = &cells[verified.index];
        let fill = match fills.get(&sheet_row) {
            Some(color) => color.as_str().bright_black(),
            None => "no fill".bright_black(),
        };
        println!(
            "  {:>5}  {:<12} {:<3} {}",
            sheet_row + 1,
            reference.to_string().cyan(),
            value.to_string(),
            fill
        );
    }
}
