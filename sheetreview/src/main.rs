use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use sheetreview_core::{
    Command, MonthFilter, Outcome, ReviewConfig, Session, classify, reader, verified_fills,
};
use std::path::{Path, PathBuf};

mod formatter;

#[derive(Parser)]
#[command(name = "sheetreview")]
#[command(about = "Import, filter and verify product review spreadsheets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Action,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the review store and session
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log progress (same as RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Action {
    /// Replace the review store with the rows of a spreadsheet
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List stored products reviewed in a month
    List {
        /// Month name, 3-letter abbreviation, number, or "all" (default: current month)
        #[arg(short, long)]
        month: Option<MonthFilter>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Mark every product with REFERENCE as verified
    Verify {
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },
    /// Mark every product with REFERENCE as not verified
    Unverify {
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },
    /// Show how the columns of a spreadsheet would be classified
    Classify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show the active spreadsheet and the fills of its verified column
    Inspect,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::init_from_env(Env::default().default_filter_or(default_filter));

    let mut config = ReviewConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default config".to_string(),
    })?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    match cli.command {
        Action::Import { file } => {
            let mut session = open_session(config)?;
            let outcome = session
                .dispatch(Command::Import { path: file.clone() })
                .with_context(|| format!("Failed to import {}", file.display()))?;
            if let Outcome::Imported(report) = outcome {
                formatter::print_import(&report);
            }
        }
        Action::List { month, format } => {
            let mut session = open_session(config)?;
            let month = month.unwrap_or_else(MonthFilter::current);
            let outcome = session
                .dispatch(Command::Query { month })
                .context("Failed to query review store")?;
            if let Outcome::Rows(rows) = outcome {
                match format {
                    OutputFormat::Human => formatter::print_human(month, &rows),
                    OutputFormat::Json => formatter::print_json(month, &rows)?,
                }
            }
        }
        Action::Verify { reference } => toggle(&mut open_session(config)?, reference, true)?,
        Action::Unverify { reference } => toggle(&mut open_session(config)?, reference, false)?,
        Action::Classify { file } => classify_file(&file, config.sheet.as_deref())?,
        Action::Inspect => inspect(&open_session(config)?)?,
    }

    Ok(())
}

fn open_session(config: ReviewConfig) -> Result<Session> {
    let store_path = config.database_path()?;
    Session::open(config)
        .with_context(|| format!("Failed to open review store at {}", store_path.display()))
}

fn toggle(session: &mut Session, reference: String, verified: bool) -> Result<()> {
    let outcome = session
        .dispatch(Command::ToggleVerified {
            reference: reference.clone(),
            verified,
        })
        .with_context(|| format!("Failed to update '{}' in the review store", reference))?;

    if let Outcome::Toggled(report) = outcome {
        formatter::print_toggle(&report);
        if report.diverged() {
            // Store already updated; signal the mismatch to scripts
            std::process::exit(2);
        }
    }
    Ok(())
}

fn classify_file(file: &Path, sheet: Option<&str>) -> Result<()> {
    let table = reader::read_table(file, sheet)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let classification =
        classify(&table).with_context(|| format!("Failed to classify {}", file.display()))?;
    formatter::print_classification(file, &table.sheet, &classification);
    Ok(())
}

fn inspect(session: &Session) -> Result<()> {
    let Some(active) = session.active() else {
        bail!("No spreadsheet has been imported yet");
    };

    let workbook = reader::read_workbook(&active.path)
        .with_context(|| format!("Failed to read {}", active.path.display()))?;
    let Some(index) = workbook.table_index(Some(&active.sheet)) else {
        bail!("Sheet '{}' no longer exists in {}", active.sheet, active.path.display());
    };
    let table = &workbook.tables[index];
    let current = classify(table).context("Spreadsheet no longer classifies")?;

    let fills = match &current.verified {
        Some(col) => {
            verified_fills(&active.path, index, table.origin.1 + col.index as u32)
                .context("Failed to read cell fills")?
        }
        None => Default::default(),
    };

    formatter::print_inspect(active, table, &current, &fills, session.store().count()?);
    Ok(())
}
