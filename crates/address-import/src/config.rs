//! Import configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Default number of aggregates written per batch during a full import.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Upper bound on the batch size.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// How a catch-up run records progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointMode {
    /// Apply and store each discrete checkpoint on its own.
    #[default]
    Granular,
    /// Apply the whole range and store only its end.
    Range,
}

impl CheckpointMode {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointMode::Granular => "granular",
            CheckpointMode::Range => "range",
        }
    }
}

impl Display for CheckpointMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CheckpointMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "granular" => Ok(CheckpointMode::Granular),
            "range" => Ok(CheckpointMode::Range),
            _ => Err(format!("Unknown checkpoint mode: {s}")),
        }
    }
}

/// Credentials for the registry feed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCredentials {
    api_key: String,
}

impl FeedCredentials {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Settings for an import run.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Credentials handed to the feed client.
    pub feed: FeedCredentials,

    /// Aggregates per write batch during a full import.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Catch-up checkpoint granularity.
    #[serde(default)]
    pub checkpoint_mode: CheckpointMode,

    /// PostgreSQL connection string for the checkpoint store.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Carry over the checkpoint of the legacy store on first start.
    #[serde(default)]
    pub enable_migration: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl std::fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportConfig")
            .field("feed", &self.feed)
            .field("batch_size", &self.batch_size)
            .field("checkpoint_mode", &self.checkpoint_mode)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("enable_migration", &self.enable_migration)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl ImportConfig {
    /// Configuration with defaults for everything but the credentials.
    #[must_use]
    pub fn new(feed: FeedCredentials) -> Self {
        Self {
            feed,
            batch_size: DEFAULT_BATCH_SIZE,
            checkpoint_mode: CheckpointMode::default(),
            database_url: None,
            enable_migration: false,
            log_filter: default_log_filter(),
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_checkpoint_mode(mut self, mode: CheckpointMode) -> Self {
        self.checkpoint_mode = mode;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value is
    /// invalid.
    ///
    /// # Required Variables
    ///
    /// - `ADDRESS_IMPORT_FEED_API_KEY` - Registry feed API key
    ///
    /// # Optional Variables
    ///
    /// - `ADDRESS_IMPORT_BATCH_SIZE` - Write batch size (default: 5000)
    /// - `ADDRESS_IMPORT_CHECKPOINT_MODE` - `granular` or `range` (default: granular)
    /// - `ADDRESS_IMPORT_DATABASE_URL` - PostgreSQL connection string
    /// - `ADDRESS_IMPORT_ENABLE_MIGRATION` - Migrate legacy checkpoints (default: false)
    /// - `RUST_LOG` - Log level filter (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ADDRESS_IMPORT_FEED_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("ADDRESS_IMPORT_FEED_API_KEY".to_string()))?;

        let batch_size = match lookup("ADDRESS_IMPORT_BATCH_SIZE") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                var: "ADDRESS_IMPORT_BATCH_SIZE".to_string(),
                message: format!("{e}"),
            })?,
            None => DEFAULT_BATCH_SIZE,
        };

        let checkpoint_mode = match lookup("ADDRESS_IMPORT_CHECKPOINT_MODE") {
            Some(raw) => raw
                .parse::<CheckpointMode>()
                .map_err(|message| ConfigError::InvalidValue {
                    var: "ADDRESS_IMPORT_CHECKPOINT_MODE".to_string(),
                    message,
                })?,
            None => CheckpointMode::default(),
        };

        let enable_migration = match lookup("ADDRESS_IMPORT_ENABLE_MIGRATION") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                var: "ADDRESS_IMPORT_ENABLE_MIGRATION".to_string(),
                message: format!("expected true or false, got '{raw}'"),
            })?,
            None => false,
        };

        let config = Self {
            feed: FeedCredentials::new(api_key),
            batch_size,
            checkpoint_mode,
            database_url: lookup("ADDRESS_IMPORT_DATABASE_URL").filter(|url| !url.is_empty()),
            enable_migration,
            log_filter: lookup("RUST_LOG").unwrap_or_else(default_log_filter),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.api_key().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "ADDRESS_IMPORT_FEED_API_KEY".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                var: "ADDRESS_IMPORT_BATCH_SIZE".to_string(),
                message: format!("must be between 1 and {MAX_BATCH_SIZE}"),
            });
        }
        if self.enable_migration && self.database_url.is_none() {
            return Err(ConfigError::InvalidValue {
                var: "ADDRESS_IMPORT_ENABLE_MIGRATION".to_string(),
                message: "migration requires ADDRESS_IMPORT_DATABASE_URL".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ImportConfig::from_lookup(lookup(&[("ADDRESS_IMPORT_FEED_API_KEY", "secret")]))
                .unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.checkpoint_mode, CheckpointMode::Granular);
        assert!(!config.enable_migration);
        assert_eq!(config.log_filter, "info");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let err = ImportConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref var) if var == "ADDRESS_IMPORT_FEED_API_KEY"));
    }

    #[test]
    fn test_blank_api_key() {
        let err = ImportConfig::from_lookup(lookup(&[("ADDRESS_IMPORT_FEED_API_KEY", "   ")]))
            .unwrap_err();
        assert!(err.to_string().contains("must not be blank"));
    }

    #[test]
    fn test_overrides() {
        let config = ImportConfig::from_lookup(lookup(&[
            ("ADDRESS_IMPORT_FEED_API_KEY", "secret"),
            ("ADDRESS_IMPORT_BATCH_SIZE", "250"),
            ("ADDRESS_IMPORT_CHECKPOINT_MODE", "RANGE"),
            ("ADDRESS_IMPORT_DATABASE_URL", "postgres://localhost/address"),
            ("ADDRESS_IMPORT_ENABLE_MIGRATION", "true"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.checkpoint_mode, CheckpointMode::Range);
        assert!(config.enable_migration);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_batch_size() {
        for raw in ["0", "abc", "100001"] {
            let result = ImportConfig::from_lookup(lookup(&[
                ("ADDRESS_IMPORT_FEED_API_KEY", "secret"),
                ("ADDRESS_IMPORT_BATCH_SIZE", raw),
            ]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_migration_requires_database() {
        let err = ImportConfig::from_lookup(lookup(&[
            ("ADDRESS_IMPORT_FEED_API_KEY", "secret"),
            ("ADDRESS_IMPORT_ENABLE_MIGRATION", "yes"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ImportConfig::new(FeedCredentials::new("super-secret"));
        config.database_url = Some("postgres://user:pw@host/db".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("pw@host"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"feed": {"api_key": "secret"}}"#).unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.checkpoint_mode, CheckpointMode::Granular);
        config.validate().unwrap();
    }
}
