//! Fixed-offset clock used for record timestamps and partition naming.
//!
//! Partitions are keyed by the calendar date in one configured offset
//! (UTC+8 by default) regardless of the host timezone, so every writer on
//! the machine agrees on which file "today" is.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SecondsFormat, Utc};

use crate::core::errors::{LinelogError, Result};

/// Offset used when none is configured: UTC+08:00.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Date format of partition file stems.
pub const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Wall clock pinned to a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionClock {
    offset: FixedOffset,
}

impl PartitionClock {
    /// Build a clock for `minutes` east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| LinelogError::InvalidConfig {
                details: format!("utc offset of {minutes} minutes is out of range"),
            })?;
        Ok(Self { offset })
    }

    /// The configured offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant expressed in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Current calendar date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Default for PartitionClock {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// ISO-8601 timestamp with microseconds and an explicit `+HH:MM` offset.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a canonical `YYYY-MM-DD` partition date.
///
/// Non-padded forms such as `2026-2-1` are rejected so that a date always
/// maps to exactly one file name.
pub fn parse_partition_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, PARTITION_DATE_FORMAT)
        .ok()
        .filter(|date| format_partition_date(*date) == trimmed)
        .ok_or_else(|| LinelogError::InvalidDate {
            raw: raw.to_string(),
        })
}

/// Render a partition date as `YYYY-MM-DD`.
pub fn format_partition_date(date: NaiveDate) -> String {
    date.format(PARTITION_DATE_FORMAT).to_string()
}
