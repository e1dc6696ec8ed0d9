//! Change estimator: line-count deltas from edit tool parameters.
//!
//! This is deliberately not a diff. Each tool kind maps its parameters to a
//! pair of line counts and the delta is their difference:
//!
//! | kind | additions | deletions |
//! |---|---|---|
//! | `Write` | `lines(content)` | 0 |
//! | `Edit` | `max(0, lines(new) - lines(old))` | `max(0, lines(old) - lines(new))` |
//! | `NotebookEdit` | `lines(new_source)` | 0 |
//! | other | 0 | 0 |
//!
//! Known limitations: a `Write` that overwrites an existing file reports the
//! whole new content as added and nothing as deleted, and a notebook edit is
//! counted the same way whether it modifies or creates a cell. An `Edit` that
//! rewrites three lines in place reports no change at all.

pub mod tool_kind;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use tool_kind::ToolKind;

/// Signed/unsigned line counts for one edit operation.
///
/// `net_change == additions - deletions` always holds for values produced
/// by [`LineDelta::from_counts`] and [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineDelta {
    pub additions: u64,
    pub deletions: u64,
    pub net_change: i64,
}

impl LineDelta {
    /// The "nothing to record" sentinel.
    pub const ZERO: Self = Self {
        additions: 0,
        deletions: 0,
        net_change: 0,
    };

    /// Delta between an old and a new line count.
    pub fn from_counts(old_lines: u64, new_lines: u64) -> Self {
        Self {
            additions: new_lines.saturating_sub(old_lines),
            deletions: old_lines.saturating_sub(new_lines),
            net_change: to_i64(new_lines) - to_i64(old_lines),
        }
    }

    /// Content counted as purely added lines.
    pub fn pure_addition(lines: u64) -> Self {
        Self::from_counts(0, lines)
    }

    /// True when neither additions nor deletions were counted.
    pub const fn is_zero(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}

/// Number of lines in `text`.
///
/// Empty text has no lines; otherwise every `\n` ends a line and a trailing
/// unterminated fragment counts as one more. A final `\n` does not start a
/// new empty line.
pub fn count_lines(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let newlines = memchr::memchr_iter(b'\n', text.as_bytes()).count() as u64;
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Estimate the line delta for one tool invocation.
///
/// Total: missing or non-string parameters count as empty text and unknown
/// tool kinds yield [`LineDelta::ZERO`].
pub fn estimate(kind: &ToolKind, params: &Map<String, Value>) -> LineDelta {
    match kind {
        ToolKind::WriteFile => LineDelta::pure_addition(count_lines(param(params, "content"))),
        ToolKind::EditFile => LineDelta::from_counts(
            count_lines(param(params, "old_string")),
            count_lines(param(params, "new_string")),
        ),
        ToolKind::EditNotebookCell => {
            LineDelta::pure_addition(count_lines(param(params, "new_source")))
        }
        ToolKind::Unknown(_) => LineDelta::ZERO,
    }
}

fn param<'a>(params: &'a Map<String, Value>, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or("")
}

#[allow(clippy::cast_possible_wrap)]
fn to_i64(lines: u64) -> i64 {
    // Line counts are bounded by input size, far below i64::MAX.
    lines.min(i64::MAX as u64) as i64
}
