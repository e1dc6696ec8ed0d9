//! One logged line-change event, as stored in a partition line.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::core::clock::format_timestamp;
use crate::estimator::{LineDelta, ToolKind};

/// Identity written when no author email can be resolved.
pub const UNKNOWN_EMAIL: &str = "unknown";

/// A single partition line. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// ISO-8601 creation time in the partition clock's offset.
    pub timestamp: String,
    pub session_id: String,
    pub email: String,
    pub tool: String,
    pub additions: u64,
    pub deletions: u64,
    /// Always `additions - deletions`.
    pub net_change: i64,
}

/// Everything about a record except the time it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub session_id: String,
    pub email: String,
    pub tool: ToolKind,
    pub delta: LineDelta,
}

impl RecordDraft {
    /// Stamp the draft, producing the immutable record.
    pub fn stamp(self, at: &DateTime<FixedOffset>) -> Record {
        Record {
            timestamp: format_timestamp(at),
            session_id: self.session_id,
            email: self.email,
            tool: self.tool.as_str().to_string(),
            additions: self.delta.additions,
            deletions: self.delta.deletions,
            net_change: self.delta.net_change,
        }
    }
}

impl Record {
    /// Line-count delta carried by this record.
    pub const fn delta(&self) -> LineDelta {
        LineDelta {
            additions: self.additions,
            deletions: self.deletions,
            net_change: self.net_change,
        }
    }

    /// Whether `net_change` equals `additions - deletions`.
    pub fn is_consistent(&self) -> bool {
        i128::from(self.additions) - i128::from(self.deletions) == i128::from(self.net_change)
    }

    /// `YYYY-MM-DD` prefix of the timestamp, which is the partition date for
    /// records written by [`crate::logger::writer::PartitionWriter`].
    pub fn date_key(&self) -> &str {
        self.timestamp.get(..10).unwrap_or(&self.timestamp)
    }
}
