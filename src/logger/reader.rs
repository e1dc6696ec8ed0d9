//! Partition reader: tolerant, lock-free scans of stored records.
//!
//! Readers never take the writer lock. A writer that crashed mid-line, or one
//! that is appending while we read, can leave a torn last line; such lines
//! and any other malformed ones are skipped with a warning and the rest of
//! the partition is still returned.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::core::clock::parse_partition_date;
use crate::core::errors::{LinelogError, Result};
use crate::logger::record::Record;
use crate::logger::writer::{PARTITION_EXTENSION, partition_path};

/// Read-only view over a log root.
#[derive(Debug, Clone)]
pub struct PartitionReader {
    root: PathBuf,
}

impl PartitionReader {
    /// Reader over the partitions in `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the partitions.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the log root exists at all.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Records of one partition in arrival order.
    ///
    /// A missing partition is an empty result, not an error.
    pub fn read(&self, date: NaiveDate) -> Result<Vec<Record>> {
        let path = partition_path(&self.root, date);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LinelogError::io(&path, source)),
        };
        read_records(BufReader::new(file), &path)
    }

    /// Dates of every partition present, ascending.
    ///
    /// Files whose stem is not a canonical `YYYY-MM-DD` are ignored. A
    /// missing root yields an empty list.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LinelogError::io(&self.root, source)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LinelogError::io(&self.root, source))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PARTITION_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(date) = parse_partition_date(stem) {
                dates.push(date);
            }
        }
        dates.sort_unstable();
        Ok(dates)
    }
}

/// Parse newline-delimited records, skipping blank and malformed lines.
fn read_records<R: BufRead>(mut reader: R, path: &Path) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0_usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| LinelogError::io(path, source))?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_slice::<Record>(line) {
            Ok(record) if record.is_consistent() => records.push(record),
            Ok(record) => {
                tracing::warn!(
                    path = %path.display(),
                    line = line_no,
                    additions = record.additions,
                    deletions = record.deletions,
                    net_change = record.net_change,
                    "skipping partition line whose net change does not add up"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = line_no,
                    error = %e,
                    "skipping malformed partition line"
                );
            }
        }
    }

    Ok(records)
}
