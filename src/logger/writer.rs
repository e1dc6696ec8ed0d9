//! Partition writer: durable, cross-process-serialized record appends.
//!
//! Protocol for one append:
//! 1. ensure the log root exists
//! 2. open `<root>/<YYYY-MM-DD>.jsonl` in append mode, creating it if absent
//! 3. take the exclusive lock on that handle (blocks, no timeout)
//! 4. `write_all` one complete, newline-terminated JSON line
//! 5. `sync_data` before the lock is released
//!
//! The line is assembled in memory first so the only work inside the
//! critical section is a single write and an fsync. The lock guard drops on
//! every exit path, including a failed write.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::core::clock::{PartitionClock, format_partition_date};
use crate::core::errors::{LinelogError, Result};
use crate::logger::lock::ExclusiveLock;
use crate::logger::record::{Record, RecordDraft};

/// File extension of partition files.
pub const PARTITION_EXTENSION: &str = "jsonl";

/// Path of the partition for `date` under `root`.
pub fn partition_path(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(format!(
        "{}.{PARTITION_EXTENSION}",
        format_partition_date(date)
    ))
}

/// Appends records to the partition for the current day.
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    root: PathBuf,
    clock: PartitionClock,
}

impl PartitionWriter {
    /// Writer rooted at `root`, dating partitions with `clock`.
    pub fn new(root: impl Into<PathBuf>, clock: PartitionClock) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Directory holding the partitions.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stamp `draft` with the current time and append it to today's partition.
    pub fn append(&self, draft: RecordDraft) -> Result<Record> {
        self.append_at(draft, &self.clock.now())
    }

    /// Stamp `draft` with `at` and append it to the partition for `at`'s date.
    ///
    /// Both the timestamp and the partition come from the same instant, so a
    /// record never lands in a file whose date disagrees with its timestamp.
    pub fn append_at(&self, draft: RecordDraft, at: &DateTime<FixedOffset>) -> Result<Record> {
        let record = draft.stamp(at);
        let path = partition_path(&self.root, at.date_naive());

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let file = open_append(&path)?;
        let mut locked = ExclusiveLock::acquire(file, &path)?;
        locked
            .write_all(line.as_bytes())
            .map_err(|source| LinelogError::io(&path, source))?;
        locked
            .sync_data()
            .map_err(|source| LinelogError::io(&path, source))?;
        drop(locked);

        tracing::debug!(
            path = %path.display(),
            tool = %record.tool,
            additions = record.additions,
            deletions = record.deletions,
            "record appended"
        );
        Ok(record)
    }
}

/// Open or create a partition for appending, creating the log root if needed.
fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| LinelogError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LinelogError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{LineDelta, ToolKind};
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::thread;

    fn draft(session: &str, delta: LineDelta) -> RecordDraft {
        RecordDraft {
            session_id: session.to_string(),
            email: "dev@example.com".to_string(),
            tool: ToolKind::WriteFile,
            delta,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn partition_path_uses_padded_date() {
        let path = partition_path(
            Path::new("/logs"),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        assert_eq!(path, PathBuf::from("/logs/2026-02-01.jsonl"));
    }

    #[test]
    fn append_creates_root_and_partition_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("code-log");
        let writer = PartitionWriter::new(&root, PartitionClock::default());

        let record = writer
            .append_at(draft("s1", LineDelta::pure_addition(3)), &at(2026, 2, 1, 9))
            .unwrap();

        let path = root.join("2026-02-01.jsonl");
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        assert_eq!(contents.lines().count(), 1);
        let parsed: Record = serde_json::from_str(contents.trim_end()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn appends_preserve_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PartitionWriter::new(dir.path(), PartitionClock::default());
        for i in 0..5 {
            writer
                .append_at(
                    draft(&format!("s{i}"), LineDelta::pure_addition(i + 1)),
                    &at(2026, 2, 1, 10),
                )
                .unwrap();
        }
        let contents = fs::read_to_string(dir.path().join("2026-02-01.jsonl")).unwrap();
        let sessions: Vec<String> = contents
            .lines()
            .map(|l| serde_json::from_str::<Record>(l).unwrap().session_id)
            .collect();
        assert_eq!(sessions, ["s0", "s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn partition_follows_append_instant() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PartitionWriter::new(dir.path(), PartitionClock::default());
        writer
            .append_at(draft("a", LineDelta::pure_addition(1)), &at(2026, 2, 1, 23))
            .unwrap();
        writer
            .append_at(draft("b", LineDelta::pure_addition(1)), &at(2026, 2, 2, 0))
            .unwrap();
        assert!(dir.path().join("2026-02-01.jsonl").exists());
        assert!(dir.path().join("2026-02-02.jsonl").exists());
    }

    #[test]
    fn append_reports_io_error_for_unwritable_root() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let writer = PartitionWriter::new(blocker.join("code-log"), PartitionClock::default());

        let err = writer
            .append_at(draft("s", LineDelta::pure_addition(1)), &at(2026, 2, 1, 9))
            .unwrap_err();
        assert_eq!(err.code(), "LL-3001");
    }

    #[test]
    fn concurrent_appends_produce_whole_lines() {
        const WRITERS: usize = 64;
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(PartitionWriter::new(dir.path(), PartitionClock::default()));
        let when = at(2026, 2, 1, 12);

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    // Large session ids make torn writes visible if locking fails.
                    let session = format!("{i:04}-{}", "x".repeat(4096));
                    writer
                        .append_at(draft(&session, LineDelta::pure_addition(1)), &when)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(dir.path().join("2026-02-01.jsonl")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), WRITERS);
        let mut seen: Vec<String> = lines
            .iter()
            .map(|l| serde_json::from_str::<Record>(l).unwrap().session_id[..4].to_string())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), WRITERS);
    }
}
