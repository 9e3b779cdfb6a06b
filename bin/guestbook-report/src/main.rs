//! # Guestbook Report
//!
//! Prints who signed the guestbook on a given day.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use gb_config::Overrides;
use gb_core::models::JournalRecord;
use gb_core::traits::EntryJournal;
use gb_journal_csv::DailyCsvJournal;
use tracing_subscriber::EnvFilter;

/// Summarize one day of guestbook entries
#[derive(Parser, Debug)]
#[command(name = "guestbook-report", version)]
struct Cli {
    /// Directory holding the daily visitor logs
    #[arg(long)]
    journal_path: Option<PathBuf>,

    /// Day to report on (YYYY-MM-DD). Defaults to today, UTC
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Settings file (TOML). Defaults to ./guestbook.toml when present
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        journal_path: cli.journal_path.clone(),
        ..Default::default()
    };
    let settings = gb_config::load(cli.config.as_deref(), &overrides)
        .context("loading settings")?;

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    let journal = DailyCsvJournal::new(
        settings.journal.path.clone(),
        settings.journal.include_source,
    );
    tracing::info!(path = %journal.path_for(date).display(), "reading daily log");

    let records = journal
        .read_day(date)
        .await
        .with_context(|| format!("reading visitor log for {date}"))?;
    for record in &records {
        tracing::debug!(%record, "visitor entry");
    }

    print!("{}", render_report(date, &records));
    Ok(())
}

fn render_report(date: NaiveDate, records: &[JournalRecord]) -> String {
    if records.is_empty() {
        return format!("No visitors left messages on {date}\n");
    }

    let mut out = format!("{} visitors left messages on {date}:\n", records.len());
    for record in records {
        out.push_str(&record.visitor_summary());
        out.push('\n');
    }
    out
}
