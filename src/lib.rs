#![forbid(unsafe_code)]

//! linelog: per-day line-change statistics for AI-assisted file edits.
//!
//! Every file-modifying tool call is turned into one record of how many lines
//! were added and removed, appended to a date-partitioned JSONL log that many
//! short-lived hook processes share safely:
//! 1. **Estimator**: line deltas from the tool's parameters alone
//! 2. **Logger**: locked appends plus tolerant reads and rollups
//! 3. **Hook**: turns one stdin event into at most one record
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use linelog::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use linelog::core::config::Config;
//! use linelog::logger::reader::PartitionReader;
//! ```

pub mod prelude;

pub mod core;
pub mod estimator;
pub mod hook;
pub mod logger;
