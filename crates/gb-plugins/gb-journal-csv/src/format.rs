//! Line format of the daily journal files.
//!
//! ```text
//! Time,[Source,]First Name,Last Name,City,State,Country,Message
//! <timestamp>,["<source>",]<first>,<last>,<city>,<state>,<country>,"<message>"
//! ```

use chrono::NaiveDate;
use gb_core::models::VisitorEntry;

/// Unix `date` style, always UTC: `Fri Mar  1 14:05:09 UTC 2024`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

pub const FILE_PREFIX: &str = "visitor-log-";
pub const FILE_EXTENSION: &str = "csv";

pub const COL_TIME: &str = "Time";
pub const COL_SOURCE: &str = "Source";
pub const COL_FIRST_NAME: &str = "First Name";
pub const COL_LAST_NAME: &str = "Last Name";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_COUNTRY: &str = "Country";
pub const COL_MESSAGE: &str = "Message";

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// `visitor-log-2024-03-01.csv`
pub fn file_name(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}.{FILE_EXTENSION}", date.format("%Y-%m-%d"))
}

/// Column names in the order `serialize` emits them. No trailing newline.
pub fn header(include_source: bool) -> String {
    columns(include_source).join(",")
}

pub fn columns(include_source: bool) -> Vec<&'static str> {
    let mut cols = vec![COL_TIME];
    if include_source {
        cols.push(COL_SOURCE);
    }
    cols.extend([
        COL_FIRST_NAME,
        COL_LAST_NAME,
        COL_CITY,
        COL_STATE,
        COL_COUNTRY,
        COL_MESSAGE,
    ]);
    cols
}

/// Renders one record line (no trailing newline).
///
/// Source and message are always quoted. The other fields are quoted only
/// when they carry a delimiter or quote. Embedded quotes are doubled and line
/// breaks become a single space, so a record is always one physical line.
pub fn serialize(entry: &VisitorEntry, include_source: bool) -> String {
    let mut line = entry
        .timestamp()
        .format(TIMESTAMP_FORMAT)
        .to_string();

    if include_source {
        line.push(DELIMITER);
        push_field(&mut line, entry.source.as_deref().unwrap_or_default(), true);
    }
    for value in [
        &entry.first_name,
        &entry.last_name,
        &entry.city,
        &entry.state,
        &entry.country,
    ] {
        line.push(DELIMITER);
        push_field(&mut line, value, false);
    }
    line.push(DELIMITER);
    push_field(&mut line, &entry.message, true);
    line
}

fn push_field(out: &mut String, value: &str, always_quote: bool) {
    let value = collapse_line_breaks(value);
    let quote = always_quote || value.contains([DELIMITER, QUOTE]);
    if !quote {
        out.push_str(&value);
        return;
    }

    out.push(QUOTE);
    for ch in value.chars() {
        if ch == QUOTE {
            out.push(QUOTE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
}

fn collapse_line_breaks(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_break = false;
    for ch in value.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            out.push(ch);
            in_break = false;
        }
    }
    out
}

/// Splits one line into fields, honouring quotes and doubled quotes.
pub fn split_record(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut at_field_start = true;

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            QUOTE if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            DELIMITER => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            _ => {
                field.push(ch);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}
