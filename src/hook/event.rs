//! Decoding of one inbound tool-invocation event.

#![allow(missing_docs)]

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::estimator::ToolKind;

/// Legacy field inside `tool_input` that carries the tool name.
pub const EMBEDDED_TOOL_FIELD: &str = "___TOOL_NAME___";

/// Tool name used when the event names none.
pub const FALLBACK_TOOL_NAME: &str = "Unknown";

/// Wire shape of a hook event. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Normalized (tool kind, parameters, session id) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEvent {
    pub tool: ToolKind,
    /// `tool_input` with the embedded tool name still present.
    pub params: Map<String, Value>,
    pub session_id: String,
}

impl ToolEvent {
    /// Decode a raw JSON payload; `None` for empty or unparseable input.
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            tracing::warn!("hook input is empty, nothing to record");
            return None;
        }
        match serde_json::from_str::<RawEvent>(raw) {
            Ok(event) => Some(Self::from_raw(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse hook input");
                None
            }
        }
    }

    /// Normalize a decoded event.
    ///
    /// The embedded tool name wins over the top-level one; a missing or
    /// empty session id is replaced with the current Unix time in seconds.
    pub fn from_raw(raw: RawEvent) -> Self {
        let params = match raw.tool_input {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let tool_name = params
            .get(EMBEDDED_TOOL_FIELD)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| raw.tool_name.filter(|name| !name.is_empty()))
            .unwrap_or_else(|| FALLBACK_TOOL_NAME.to_string());

        let session_id = raw
            .session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(fallback_session_id);

        Self {
            tool: ToolKind::from_name(&tool_name),
            params,
            session_id,
        }
    }
}

/// Session id for events that carry none: Unix seconds as a string.
///
/// Concurrent invocations within the same second share this id.
pub fn fallback_session_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
        .to_string()
}
