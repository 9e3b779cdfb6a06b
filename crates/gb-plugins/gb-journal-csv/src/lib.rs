//! # gb-journal-csv
//! guestbook/crates/gb-plugins/gb-journal-csv/src/lib.rs
//! Local filesystem implementation of `EntryJournal`.
//! One CSV file per UTC day, a header row on first write, appends after that.

pub mod format;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use gb_core::error::{AppError, Result};
use gb_core::models::{JournalRecord, VisitorEntry};
use gb_core::traits::EntryJournal;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Owner read/write, everyone else read-only.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

pub struct DailyCsvJournal {
    /// Directory holding the daily files (e.g., "../journal")
    root_path: PathBuf,
    /// Whether files carry the `Source` column
    include_source: bool,
    /// One write lock per daily file. Appends to the same file never overlap.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DailyCsvJournal {
    pub fn new(root: PathBuf, include_source: bool) -> Self {
        Self {
            root_path: root,
            include_source,
            locks: DashMap::new(),
        }
    }

    /// `<root>/visitor-log-<YYYY-MM-DD>.csv`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.root_path.join(format::file_name(date))
    }

    /// The record line `append_to_daily_log` writes for `entry`.
    pub fn serialize(&self, entry: &VisitorEntry) -> String {
        format::serialize(entry, self.include_source)
    }

    /// Appends `entry` to its day's file, writing the header first if the
    /// file is empty. Header and record go out in a single write while the
    /// file's lock is held. A file that already has a header keeps its own
    /// column layout, even if `include_source` has changed since.
    pub async fn append_to_daily_log(&self, entry: &VisitorEntry) -> Result<()> {
        let path = self.path_for(entry.timestamp().date_naive());
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let mut file = open_append(&path).await?;

        let mut buf = String::new();
        let include_source = if file.metadata().await?.len() == 0 {
            tracing::debug!(path = %path.display(), "starting new daily journal file");
            buf.push_str(&format::header(self.include_source));
            buf.push('\n');
            self.include_source
        } else {
            self.existing_layout(&path).await?
        };
        buf.push_str(&format::serialize(entry, include_source));
        buf.push('\n');

        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Whether the header already in `path` carries the `Source` column.
    /// Anything other than one of the two known headers is refused.
    async fn existing_layout(&self, path: &Path) -> Result<bool> {
        let mut reader = BufReader::new(fs::File::open(path).await?);
        let mut first = String::new();
        reader.read_line(&mut first).await?;
        let first = first.trim_end_matches(['\r', '\n']);

        let include_source = if first == format::header(true) {
            true
        } else if first == format::header(false) {
            false
        } else {
            return Err(AppError::MalformedRecord {
                line: 1,
                reason: format!("unrecognized journal header {first:?}"),
            });
        };

        if include_source != self.include_source {
            tracing::warn!(
                path = %path.display(),
                include_source,
                "daily file was started with a different column layout; keeping it"
            );
        }
        Ok(include_source)
    }

    /// Reads `visitor-log-<date>.csv` back, mapping each row by header name.
    pub async fn read_daily_log(&self, date: NaiveDate) -> Result<Vec<JournalRecord>> {
        let path = self.path_for(date);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        parse_daily_log(&contents)
    }

    /// Returns the lock for `path`. Creating a lock for a new file also
    /// drops the locks of files nobody is writing to, so the map only ever
    /// holds the days currently in use.
    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(path).map(|l| Arc::clone(l.value())) {
            return lock;
        }
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(self.locks.entry(path.to_path_buf()).or_default().value())
    }
}

#[async_trait]
impl EntryJournal for DailyCsvJournal {
    async fn append(&self, entry: &VisitorEntry) -> Result<()> {
        self.append_to_daily_log(entry).await
    }

    async fn read_day(&self, date: NaiveDate) -> Result<Vec<JournalRecord>> {
        self.read_daily_log(date).await
    }
}

async fn open_append(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options.open(path).await
}

/// Header-aware parse of a whole daily file. Blank lines are skipped, and so
/// are rows that do not fit the header, with a warning naming the line.
fn parse_daily_log(contents: &str) -> Result<Vec<JournalRecord>> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns = format::split_record(header).map_err(|reason| AppError::MalformedRecord {
        line: header_line,
        reason,
    })?;
    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for required in format::columns(false) {
        if !index.contains_key(required) {
            return Err(AppError::MalformedRecord {
                line: header_line,
                reason: format!("header is missing the {required:?} column"),
            });
        }
    }

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let fields = match format::split_record(line) {
            Ok(fields) if fields.len() == columns.len() => fields,
            Ok(fields) => {
                tracing::warn!(
                    line = line_no,
                    expected = columns.len(),
                    found = fields.len(),
                    "skipping journal row with wrong field count"
                );
                continue;
            }
            Err(reason) => {
                tracing::warn!(line = line_no, %reason, "skipping unparseable journal row");
                continue;
            }
        };

        let get = |name: &str| {
            index
                .get(name)
                .map(|&i| fields[i].clone())
                .unwrap_or_default()
        };
        records.push(JournalRecord {
            time: get(format::COL_TIME),
            source: index
                .get(format::COL_SOURCE)
                .map(|&i| fields[i].clone()),
            first_name: get(format::COL_FIRST_NAME),
            last_name: get(format::COL_LAST_NAME),
            city: get(format::COL_CITY),
            state: get(format::COL_STATE),
            country: get(format::COL_COUNTRY),
            message: get(format::COL_MESSAGE),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn entry(ts: DateTime<Utc>, first: &str, message: &str) -> VisitorEntry {
        VisitorEntry::new(
            ts,
            Some("127.0.0.1:40000;test-agent".into()),
            first,
            "Doe",
            "Boston",
            "MA",
            "US",
            message,
        )
    }

    async fn lines_of(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_first_append_writes_header_then_record() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        let e = entry(at(2024, 3, 1, 9), "Jane", "Hello there");

        journal.append_to_daily_log(&e).await.unwrap();

        let path = dir.path().join("visitor-log-2024-03-01.csv");
        let lines = lines_of(&path).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format::header(true));
        assert_eq!(lines[1], journal.serialize(&e));
        assert!(lines[1].ends_with("\"Hello there\""));
    }

    #[tokio::test]
    async fn test_each_append_adds_exactly_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), false);
        let path = journal.path_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        journal
            .append_to_daily_log(&entry(at(2024, 3, 1, 8), "Jane", "first"))
            .await
            .unwrap();
        let before = fs::read_to_string(&path).await.unwrap();

        let second = entry(at(2024, 3, 1, 23), "John", "second");
        journal.append_to_daily_log(&second).await.unwrap();
        let after = fs::read_to_string(&path).await.unwrap();

        assert_eq!(after, format!("{before}{}\n", journal.serialize(&second)));
        assert_eq!(after.matches(&format::header(false)).count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_header_is_refused_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        let path = journal.path_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        fs::write(&path, "pre-existing line\n").await.unwrap();
        let result = journal
            .append_to_daily_log(&entry(at(2024, 3, 1, 12), "Jane", "hi"))
            .await;

        assert!(matches!(result, Err(AppError::MalformedRecord { line: 1, .. })));
        assert_eq!(lines_of(&path).await, ["pre-existing line"]);
    }

    #[tokio::test]
    async fn test_existing_file_keeps_its_column_layout() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let with_source = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        with_source.append(&entry(at(2024, 3, 1, 9), "Jane", "morning")).await.unwrap();

        // Restarted with the Source column switched off, same day.
        let without_source = DailyCsvJournal::new(dir.path().to_path_buf(), false);
        without_source.append(&entry(at(2024, 3, 1, 15), "John", "afternoon")).await.unwrap();

        let lines = lines_of(&with_source.path_for(date)).await;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format::header(true));
        assert_eq!(format::split_record(&lines[2]).unwrap().len(), 8);

        let records = without_source.read_day(date).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].first_name, "John");
        assert_eq!(records[1].source.as_deref(), Some("127.0.0.1:40000;test-agent"));

        // The other direction: a file started without Source stays that way.
        let next = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        without_source.append(&entry(at(2024, 3, 2, 9), "Ann", "hi")).await.unwrap();
        with_source.append(&entry(at(2024, 3, 2, 10), "Bob", "hi")).await.unwrap();
        let records = with_source.read_day(next).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source.is_none()));
    }

    #[tokio::test]
    async fn test_dates_partition_files() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);

        journal.append(&entry(at(2024, 3, 1, 0), "A", "m")).await.unwrap();
        journal.append(&entry(at(2024, 3, 1, 23), "B", "m")).await.unwrap();
        journal.append(&entry(at(2024, 3, 2, 0), "C", "m")).await.unwrap();

        let day1 = journal.read_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await.unwrap();
        let day2 = journal.read_day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()).await.unwrap();
        assert_eq!(day1.iter().map(|r| r.first_name.as_str()).collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(day2.len(), 1);
        assert_eq!(day2[0].first_name, "C");
    }

    #[tokio::test]
    async fn test_visitor_scenario_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        journal.append(&entry(at(2024, 3, 1, 10), "Jane", "Hello there")).await.unwrap();
        journal
            .append(&entry(at(2024, 3, 1, 11), "John", "Nice, \"quoted\" place"))
            .await
            .unwrap();

        let records = journal.read_day(date).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time, "Fri Mar  1 10:00:00 UTC 2024");
        assert_eq!(records[0].source.as_deref(), Some("127.0.0.1:40000;test-agent"));
        assert_eq!(records[0].visitor_summary(), "Jane Doe from Boston, MA (US)");
        assert_eq!(records[0].message, "Hello there");
        assert_eq!(records[1].message, "Nice, \"quoted\" place");
    }

    #[tokio::test]
    async fn test_missing_day_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        let records = journal
            .read_day(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_files_without_source_column_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), false);
        journal.append(&entry(at(2024, 3, 1, 10), "Jane", "hi")).await.unwrap();

        let records = journal.read_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await.unwrap();
        assert_eq!(records[0].source, None);
        assert_eq!(records[0].city, "Boston");
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped_and_the_rest_kept() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), false);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        journal.append(&entry(at(2024, 3, 1, 9), "Jane", "first")).await.unwrap();

        let mut file = open_append(&journal.path_for(date)).await.unwrap();
        file.write_all(b"only,three,fields\nTime,\"unterminated\n").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        journal.append(&entry(at(2024, 3, 1, 18), "John", "last")).await.unwrap();

        let records = journal.read_day(date).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.first_name.as_str()).collect();
        assert_eq!(names, ["Jane", "John"]);
    }

    #[tokio::test]
    async fn test_header_without_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), false);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        fs::write(journal.path_for(date), "Time,First Name,Message\na,b,c\n")
            .await
            .unwrap();

        match journal.read_day(date).await {
            Err(AppError::MalformedRecord { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected malformed header, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().join("does-not-exist"), true);
        let result = journal.append(&entry(at(2024, 3, 1, 10), "Jane", "hi")).await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(DailyCsvJournal::new(dir.path().to_path_buf(), true));

        let mut handles = Vec::new();
        for i in 0..64 {
            let journal = Arc::clone(&journal);
            handles.push(tokio::spawn(async move {
                let message = format!("message number {i} {}", "x".repeat(512));
                journal
                    .append(&entry(at(2024, 3, 1, 12), &format!("visitor{i}"), &message))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let path = journal.path_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let lines = lines_of(&path).await;
        assert_eq!(lines.len(), 65);
        assert_eq!(lines.iter().filter(|l| **l == format::header(true)).count(), 1);

        let records = journal.read_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await.unwrap();
        assert_eq!(records.len(), 64);
        assert!(records.iter().all(|r| r.message.len() > 512));
    }

    #[tokio::test]
    async fn test_old_day_locks_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        for day in 1..=5 {
            journal.append(&entry(at(2024, 3, day, 12), "Jane", "hi")).await.unwrap();
        }
        assert_eq!(journal.locks.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_not_group_or_world_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let journal = DailyCsvJournal::new(dir.path().to_path_buf(), true);
        journal.append(&entry(at(2024, 3, 1, 12), "Jane", "hi")).await.unwrap();

        let meta = fs::metadata(journal.path_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
            .await
            .unwrap();
        assert_eq!(meta.permissions().mode() & 0o022, 0);
    }
}
