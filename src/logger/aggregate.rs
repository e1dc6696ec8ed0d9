//! Aggregation over stored records: by date, user, tool, and session.
//!
//! All functions here are pure over their inputs. Grouped results use
//! `BTreeMap`/`BTreeSet` so iteration order, and therefore report output, is
//! reproducible.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::clock::format_partition_date;
use crate::core::errors::Result;
use crate::logger::reader::PartitionReader;
use crate::logger::record::Record;

/// Grouping key for [`aggregate_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Calendar date taken from the record timestamp.
    Date,
    /// Author email.
    User,
    /// Tool name.
    Tool,
    /// Session id; also collects the tools used per session.
    Session,
}

impl Dimension {
    fn key<'a>(self, record: &'a Record) -> &'a str {
        match self {
            Self::Date => record.date_key(),
            Self::User => &record.email,
            Self::Tool => &record.tool,
            Self::Session => &record.session_id,
        }
    }
}

/// Summed rollup of the records sharing one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub additions: u64,
    pub deletions: u64,
    pub net_change: i64,
    pub operations: u64,
    /// Distinct tools used; only filled for [`Dimension::Session`].
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tools: BTreeSet<String>,
}

impl Aggregate {
    /// Totals saturate rather than wrap.
    fn add(&mut self, record: &Record) {
        self.additions = self.additions.saturating_add(record.additions);
        self.deletions = self.deletions.saturating_add(record.deletions);
        self.net_change = self.net_change.saturating_add(record.net_change);
        self.operations = self.operations.saturating_add(1);
    }
}

/// Group `records` by `dimension` and sum each group.
pub fn aggregate_by<'a, I>(dimension: Dimension, records: I) -> BTreeMap<String, Aggregate>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: BTreeMap<String, Aggregate> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry(dimension.key(record).to_string())
            .or_default();
        entry.add(record);
        if dimension == Dimension::Session {
            entry.tools.insert(record.tool.clone());
        }
    }
    groups
}

/// Totals for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSummary {
    pub date: String,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub net_change: i64,
    pub total_operations: u64,
    /// Timestamp of the first line, by arrival order.
    pub first_time: String,
    /// Timestamp of the last line, by arrival order.
    pub last_time: String,
}

/// Summarize one partition's records; `None` when there are none.
///
/// First/last times are the first and last lines, not the min/max
/// timestamps: arrival order is assumed to be chronological.
pub fn aggregate_by_date(date: NaiveDate, records: &[Record]) -> Option<DateSummary> {
    let first = records.first()?;
    let last = records.last()?;

    let mut totals = Aggregate::default();
    for record in records {
        totals.add(record);
    }

    Some(DateSummary {
        date: format_partition_date(date),
        total_additions: totals.additions,
        total_deletions: totals.deletions,
        net_change: totals.net_change,
        total_operations: totals.operations,
        first_time: first.timestamp.clone(),
        last_time: last.timestamp.clone(),
    })
}

/// Per-day summaries across every partition plus grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub days: Vec<DateSummary>,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub net_change: i64,
    pub total_operations: u64,
    /// First listed partition date (including empty partitions).
    pub first_date: Option<String>,
    /// Last listed partition date (including empty partitions).
    pub last_date: Option<String>,
}

/// Summarize every partition under `reader`'s root, oldest first.
pub fn history(reader: &PartitionReader) -> Result<HistorySummary> {
    let dates = reader.list_dates()?;
    let mut summary = HistorySummary {
        first_date: dates.first().copied().map(format_partition_date),
        last_date: dates.last().copied().map(format_partition_date),
        ..HistorySummary::default()
    };

    for date in dates {
        let records = reader.read(date)?;
        if let Some(day) = aggregate_by_date(date, &records) {
            summary.total_additions = summary.total_additions.saturating_add(day.total_additions);
            summary.total_deletions = summary.total_deletions.saturating_add(day.total_deletions);
            summary.net_change = summary.net_change.saturating_add(day.net_change);
            summary.total_operations = summary.total_operations.saturating_add(day.total_operations);
            summary.days.push(day);
        }
    }

    Ok(summary)
}

/// The last `n` records in arrival order.
pub fn recent(records: &[Record], n: usize) -> &[Record] {
    &records[records.len().saturating_sub(n)..]
}

/// Groups ordered by operation count (descending, ties by key), first `n`.
pub fn top_by_operations(
    groups: &BTreeMap<String, Aggregate>,
    n: usize,
) -> Vec<(&String, &Aggregate)> {
    let mut ranked: Vec<_> = groups.iter().collect();
    ranked.sort_by(|a, b| b.1.operations.cmp(&a.1.operations).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked
}
