//! Event adapter: one tool-invocation event in, at most one record out.
//!
//! This is the composition point between the caller's hook and the log. It
//! never returns an error: every failure is logged and folded into a
//! [`HookOutcome`] so the caller's own edit is never blocked by
//! bookkeeping.

pub mod event;
pub mod identity;

use std::io::{self, IsTerminal, Read};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::estimator::{LineDelta, ToolKind, estimate};
use crate::logger::record::{Record, RecordDraft};
use crate::logger::writer::PartitionWriter;

pub use event::ToolEvent;
pub use identity::{FixedIdentity, GitIdentity, IdentityResolver};

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Input was absent or could not be decoded.
    NoInput,
    /// The estimate was zero; nothing was appended.
    Skipped {
        /// Tool the event named.
        tool: ToolKind,
    },
    /// One record was appended.
    Recorded(Record),
    /// Recording failed; the message has already been logged.
    Failed(String),
}

impl HookOutcome {
    /// Short label for diagnostics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NoInput => "no_input",
            Self::Skipped { .. } => "skipped",
            Self::Recorded(_) => "recorded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Estimator + identity + writer wired together.
pub struct Recorder<I: IdentityResolver> {
    writer: PartitionWriter,
    identity: I,
}

impl Recorder<GitIdentity> {
    /// Recorder built from the effective configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let writer = PartitionWriter::new(&config.paths.log_root, config.clock()?);
        let identity = GitIdentity::new(&config.identity.program, config.identity.timeout());
        Ok(Self::new(writer, identity))
    }
}

impl<I: IdentityResolver> Recorder<I> {
    /// Recorder appending through `writer` and attributing to `identity`.
    pub fn new(writer: PartitionWriter, identity: I) -> Self {
        Self { writer, identity }
    }

    /// Handle one raw event payload.
    pub fn handle_raw(&self, raw: &str) -> HookOutcome {
        match ToolEvent::decode(raw) {
            Some(event) => self.handle(event),
            None => HookOutcome::NoInput,
        }
    }

    /// Handle one decoded event.
    ///
    /// The identity resolver is only consulted when there is something to
    /// record.
    pub fn handle(&self, event: ToolEvent) -> HookOutcome {
        tracing::info!(tool = %event.tool, session = %event.session_id, "tool call received");

        let delta: LineDelta = estimate(&event.tool, &event.params);
        if delta.is_zero() {
            tracing::info!(tool = %event.tool, "no line changes detected, skipping");
            return HookOutcome::Skipped { tool: event.tool };
        }

        let draft = RecordDraft {
            session_id: event.session_id,
            email: self.identity.resolve(),
            tool: event.tool,
            delta,
        };

        match self.writer.append(draft) {
            Ok(record) => {
                tracing::info!(
                    tool = %record.tool,
                    additions = record.additions,
                    deletions = record.deletions,
                    net_change = record.net_change,
                    "line changes recorded"
                );
                HookOutcome::Recorded(record)
            }
            Err(e) => {
                tracing::error!(code = e.code(), error = %e, "failed to record line changes");
                HookOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Read the whole event payload from stdin.
///
/// A terminal on stdin means no caller is piping an event; that and any
/// read failure are treated as empty input.
pub fn read_stdin_event() -> String {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        tracing::warn!("stdin is a terminal, no hook input available");
        return String::new();
    }
    let mut raw = String::new();
    if let Err(e) = stdin.lock().read_to_string(&mut raw) {
        tracing::warn!(error = %e, "failed to read hook input");
        raw.clear();
    }
    raw
}
