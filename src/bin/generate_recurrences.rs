use std::{error::Error, path::PathBuf};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, macros::format_description};

use finance_tracker::{
    AppState, FixedClock,
    logging::{DEFAULT_LOG_PATH, setup_logging},
    recurrence::{RunSummary, generate_due_entries},
};

/// Create the ledger entries for recurring transactions that have fallen due.
///
/// Meant to be run once a day, e.g. from cron. Running it more than once on
/// the same day does not create duplicate entries.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: PathBuf,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, env = "FINANCE_TRACKER_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Generate entries due on or before this date (YYYY-MM-DD) instead of today.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,

    /// File path to append debug logs to.
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    log_path: PathBuf,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(&args.log_path)?;

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(connection, &args.timezone)?;
    let connection = state.connection()?;

    let summary = match args.date {
        Some(date) => generate_due_entries(&connection, &FixedClock(date))?,
        None => generate_due_entries(&connection, &state.clock()?)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("could not parse \"{text}\" as YYYY-MM-DD: {error}"))
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Processed {} recurring transactions up to {}",
        summary.processed, summary.reference_date
    );
    println!("  generated:          {}", summary.generated);
    println!("  skipped duplicates: {}", summary.skipped_duplicates);

    if !summary.stalled.is_empty() {
        println!("  stalled (unknown frequency): {:?}", summary.stalled);
    }

    for failure in &summary.failed {
        println!("  failed {}: {}", failure.id, failure.error);
    }
}
