//! Date-partitioned append-only JSONL log: records, locking, writer, reader,
//! and aggregation.

pub mod aggregate;
pub mod lock;
pub mod reader;
pub mod record;
pub mod writer;
