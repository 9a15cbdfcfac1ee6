//! Core configuration.
//!
//! # Responsibility
//! - Describe the database location, logging setup and the rating,
//!   moderation and pagination policies used by handlers.
//! - Load from a JSON file with per-field defaults, then apply
//!   `BURLANG_*` environment overrides.
//!
//! # Invariants
//! - A validated config has thresholds >= 1 and `default_per_page <= max_per_page`.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "BURLANG_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BURLANG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BURLANG_LOG_DIR";

/// Rating points credited per contribution kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatingPolicy {
    pub suggest_word: i64,
    pub suggest_translation: i64,
    pub accepted_author: i64,
    pub accepted_contributor: i64,
    pub moderation_vote: i64,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            suggest_word: 1,
            suggest_translation: 1,
            accepted_author: 5,
            accepted_contributor: 2,
            moderation_vote: 1,
        }
    }
}

/// Vote counts that close a suggestion without a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModerationPolicy {
    pub approvals_to_accept: u32,
    pub rejections_to_decline: u32,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            approvals_to_accept: 3,
            rejections_to_decline: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagePolicy {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// Top-level configuration for the core and its front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file. `None` means an in-memory database.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub rating: RatingPolicy,
    pub moderation: ModerationPolicy,
    pub page: PagePolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            rating: RatingPolicy::default(),
            moderation: ModerationPolicy::default(),
            page: PagePolicy::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies `BURLANG_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup, then re-validates.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir.trim()));
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;

        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.moderation.approvals_to_accept == 0 || self.moderation.rejections_to_decline == 0
        {
            return Err(ConfigError::Invalid(
                "moderation thresholds must be at least 1".to_string(),
            ));
        }
        if self.page.default_per_page == 0
            || self.page.default_per_page > self.page.max_per_page
        {
            return Err(ConfigError::Invalid(format!(
                "page.default_per_page must be within 1..={}",
                self.page.max_per_page
            )));
        }
        Ok(())
    }
}
