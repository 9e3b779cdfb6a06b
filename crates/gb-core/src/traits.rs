//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be wired into the server.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{JournalRecord, VisitorEntry};

/// Plain-text policy applied to every user-supplied field before storage.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Sanitizer: Send + Sync {
    /// Strips all markup from `raw` and trims surrounding whitespace.
    fn sanitize_field(&self, raw: &str) -> String;
}

/// Date-partitioned, append-only store for visitor entries.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EntryJournal: Send + Sync {
    /// Appends one entry to the file for the entry's UTC date.
    async fn append(&self, entry: &VisitorEntry) -> Result<()>;

    /// Reads every entry recorded on `date`, in file order.
    /// A day with no file is an empty day.
    async fn read_day(&self, date: NaiveDate) -> Result<Vec<JournalRecord>>;
}
