//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! Built once at process start and passed explicitly to the writer, reader
//! and hook adapter; nothing in the crate reads paths or offsets from
//! globals.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::clock::{DEFAULT_UTC_OFFSET_MINUTES, PartitionClock};
use crate::core::errors::{LinelogError, Result};

/// Full linelog configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub clock: ClockConfig,
    pub identity: IdentityConfig,
    pub report: ReportConfig,
}

/// Filesystem paths used by linelog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Directory holding the `YYYY-MM-DD.jsonl` partitions.
    pub log_root: PathBuf,
}

/// Partition clock settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClockConfig {
    /// Minutes east of UTC used for timestamps and partition dates.
    pub utc_offset_minutes: i32,
}

/// Author identity lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Version-control executable queried for `config user.email`.
    pub program: String,
    pub timeout_ms: u64,
}

/// Report surface knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Records shown by `report --recent` when no count is given.
    pub recent_default: usize,
    /// Sessions listed in a daily summary.
    pub top_sessions: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                tracing::warn!("HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("linelog").join("config.toml");
        let data = home_dir.join(".local").join("share").join("linelog");
        Self {
            config_file: cfg,
            log_root: data.join("code-log"),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout_ms: 2_000,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_default: 10,
            top_sessions: 5,
        }
    }
}

impl IdentityConfig {
    /// Lookup deadline as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LinelogError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(LinelogError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config for the hook path, which must never fail.
    ///
    /// When the file or an override is unusable, recording continues from
    /// the defaults with every env override that is individually valid
    /// still applied, so records keep landing under `LINELOG_LOG_ROOT`.
    pub fn load_for_hook(path: Option<&Path>) -> Self {
        Self::load_for_hook_with(path, env_var)
    }

    fn load_for_hook_with<F>(path: Option<&Path>, mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let error = match Self::load_with(path, &mut lookup) {
            Ok(cfg) => return cfg,
            Err(error) => error,
        };
        tracing::warn!(code = error.code(), error = %error, "config unavailable, recording with defaults");

        let mut cfg = Self::default();
        if let Some(path) = path {
            cfg.paths.config_file = path.to_path_buf();
        }
        for name in ENV_OVERRIDES {
            let mut candidate = cfg.clone();
            match candidate
                .apply_env_override(name, &mut lookup)
                .and_then(|()| candidate.validate())
            {
                Ok(()) => cfg = candidate,
                Err(e) => tracing::warn!(var = name, error = %e, "ignoring env override"),
            }
        }
        cfg
    }

    /// Partition clock for the configured offset.
    pub fn clock(&self) -> Result<PartitionClock> {
        PartitionClock::from_offset_minutes(self.clock.utc_offset_minutes)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        for name in ENV_OVERRIDES {
            self.apply_env_override(name, &mut lookup)?;
        }
        Ok(())
    }

    fn apply_env_override<F>(&mut self, name: &str, lookup: &mut F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let Some(raw) = lookup(name) else {
            return Ok(());
        };

        match name {
            "LINELOG_LOG_ROOT" => self.paths.log_root = PathBuf::from(raw),
            "LINELOG_UTC_OFFSET_MINUTES" => {
                self.clock.utc_offset_minutes = parse_env(name, &raw)?;
            }
            "LINELOG_IDENTITY_PROGRAM" => self.identity.program = raw,
            "LINELOG_IDENTITY_TIMEOUT_MS" => self.identity.timeout_ms = parse_env(name, &raw)?,
            "LINELOG_REPORT_RECENT_DEFAULT" => {
                self.report.recent_default = parse_env(name, &raw)?;
            }
            "LINELOG_REPORT_TOP_SESSIONS" => self.report.top_sessions = parse_env(name, &raw)?,
            _ => {}
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.paths.log_root.as_os_str().is_empty() {
            return Err(LinelogError::InvalidConfig {
                details: "paths.log_root must not be empty".to_string(),
            });
        }

        // Offsets must stay strictly inside one day.
        if self.clock.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(LinelogError::InvalidConfig {
                details: format!(
                    "clock.utc_offset_minutes must be within ±1439, got {}",
                    self.clock.utc_offset_minutes
                ),
            });
        }

        if self.identity.program.trim().is_empty() {
            return Err(LinelogError::InvalidConfig {
                details: "identity.program must not be empty".to_string(),
            });
        }

        if self.identity.timeout_ms == 0 {
            return Err(LinelogError::InvalidConfig {
                details: "identity.timeout_ms must be > 0".to_string(),
            });
        }

        if self.report.top_sessions == 0 {
            return Err(LinelogError::InvalidConfig {
                details: "report.top_sessions must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Environment variables consulted, in application order.
const ENV_OVERRIDES: [&str; 6] = [
    "LINELOG_LOG_ROOT",
    "LINELOG_UTC_OFFSET_MINUTES",
    "LINELOG_IDENTITY_PROGRAM",
    "LINELOG_IDENTITY_TIMEOUT_MS",
    "LINELOG_REPORT_RECENT_DEFAULT",
    "LINELOG_REPORT_TOP_SESSIONS",
];

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| LinelogError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
