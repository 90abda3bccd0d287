//! Runtime configuration for embedding transports.
//!
//! # Responsibility
//! - Resolve database location, store timeout and logging settings.
//! - Fall back to documented defaults when a variable is unset.
//!
//! # Invariants
//! - A set-but-invalid value is an error, never silently defaulted.
//! - The busy timeout is always non-zero so store calls stay bounded.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "ARTICLE_VOTE_DB";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ARTICLE_VOTE_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "ARTICLE_VOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ARTICLE_VOTE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "article_votes.sqlite3";
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    /// Upper bound on waiting for a competing writer.
    pub busy_timeout: Duration,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which returns a variable's value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = non_blank(lookup(ENV_BUSY_TIMEOUT_MS)) {
            config.busy_timeout = parse_busy_timeout(&raw)?;
        }

        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level;
        }

        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        debug!(
            "event=config_load module=config status=ok busy_timeout_ms={} file_logging={}",
            config.busy_timeout.as_millis(),
            config.log_dir.is_some()
        );
        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_busy_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: ENV_BUSY_TIMEOUT_MS,
        value: raw.to_string(),
        reason: "expected whole milliseconds",
    })?;
    busy_timeout_from_millis(millis)
}

/// Validates a store lock wait given in milliseconds.
///
/// Every transport override goes through here so the accepted range is the
/// same as for `ARTICLE_VOTE_BUSY_TIMEOUT_MS`.
pub fn busy_timeout_from_millis(millis: u64) -> Result<Duration, ConfigError> {
    if millis == 0 || millis > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::InvalidValue {
            key: ENV_BUSY_TIMEOUT_MS,
            value: millis.to_string(),
            reason: "must be between 1 and 60000",
        });
    }
    Ok(Duration::from_millis(millis))
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}
