//! # Domain Models
//!
//! These structs represent the entries that flow through the guestbook:
//! the raw form payload, the sanitized entry that gets journaled, and the
//! record read back from a daily file.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::Sanitizer;

/// Raw guestbook form exactly as submitted. Nothing here has been sanitized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorForm {
    pub fname: String,
    pub lname: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub message: String,
}

/// One submitted guestbook message, sanitized and ready to be journaled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitorEntry {
    /// Set once at construction; selects the daily file.
    timestamp: DateTime<Utc>,
    /// "<client address>;<user agent>" when the journal records origins.
    pub source: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub message: String,
}

impl VisitorEntry {
    /// Builds an entry from already-clean values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        source: Option<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            source,
            first_name: first_name.into(),
            last_name: last_name.into(),
            country: country.into(),
            city: city.into(),
            state: state.into(),
            message: message.into(),
        }
    }

    /// Runs every user-supplied value (source included) through `sanitizer`.
    pub fn from_form(
        form: VisitorForm,
        source: Option<String>,
        sanitizer: &dyn Sanitizer,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            source: source.map(|s| sanitizer.sanitize_field(&s)),
            first_name: sanitizer.sanitize_field(&form.fname),
            last_name: sanitizer.sanitize_field(&form.lname),
            country: sanitizer.sanitize_field(&form.country),
            city: sanitizer.sanitize_field(&form.city),
            state: sanitizer.sanitize_field(&form.state),
            message: sanitizer.sanitize_field(&form.message),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for VisitorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {} from {}, {} ({}) wrote: \"{}\"",
            self.timestamp.format("%B %-d, %Y"),
            self.source.as_deref().unwrap_or_default(),
            self.first_name,
            self.last_name,
            self.city,
            self.state,
            self.country,
            self.message,
        )
    }
}

/// A row read back from a daily file, fields still in their stored text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub time: String,
    /// `None` when the file was written without a `Source` column.
    pub source: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub message: String,
}

impl JournalRecord {
    /// Short "who and where" line used by the daily report.
    pub fn visitor_summary(&self) -> String {
        format!(
            "{} {} from {}, {} ({})",
            self.first_name, self.last_name, self.city, self.state, self.country
        )
    }
}

impl fmt::Display for JournalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} wrote: \"{}\"",
            self.time,
            self.source.as_deref().unwrap_or_default(),
            self.visitor_summary(),
            self.message,
        )
    }
}
