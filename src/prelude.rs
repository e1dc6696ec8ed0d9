//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use linelog::prelude::*;
//! ```

// Core
pub use crate::core::clock::PartitionClock;
pub use crate::core::config::Config;
pub use crate::core::errors::{LinelogError, Result};

// Estimator
pub use crate::estimator::{LineDelta, ToolKind, count_lines, estimate};

// Logger
pub use crate::logger::aggregate::{
    Aggregate, DateSummary, Dimension, HistorySummary, aggregate_by, aggregate_by_date, history,
};
pub use crate::logger::reader::PartitionReader;
pub use crate::logger::record::{Record, RecordDraft};
pub use crate::logger::writer::PartitionWriter;

// Hook
pub use crate::hook::{
    FixedIdentity, GitIdentity, HookOutcome, IdentityResolver, Recorder, ToolEvent,
};
