//! LL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LinelogError>;

/// Top-level error type for linelog.
#[derive(Debug, Error)]
pub enum LinelogError {
    #[error("[LL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[LL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LL-2001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[LL-2002] invalid partition date {raw:?}: expected YYYY-MM-DD")]
    InvalidDate { raw: String },

    #[error("[LL-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LL-3002] failed to lock {path}: {details}")]
    Lock { path: PathBuf, details: String },

    #[error("[LL-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl LinelogError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LL-1001",
            Self::MissingConfig { .. } => "LL-1002",
            Self::ConfigParse { .. } => "LL-1003",
            Self::Serialization { .. } => "LL-2001",
            Self::InvalidDate { .. } => "LL-2002",
            Self::Io { .. } => "LL-3001",
            Self::Lock { .. } => "LL-3002",
            Self::Runtime { .. } => "LL-3900",
        }
    }

    /// Whether the failure came from the user's input rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::InvalidDate { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for LinelogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for LinelogError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LinelogError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
