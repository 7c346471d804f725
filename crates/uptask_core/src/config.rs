//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//! - Give FFI and CLI hosts one shared notion of defaults.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - The log level is validated here, before logging starts.

use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "UPTASK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "UPTASK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "UPTASK_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "uptask.sqlite3";

/// Configuration failure.
#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(err) => write!(f, "invalid {LOG_LEVEL_ENV}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
        }
    }
}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `UPTASK_DB_PATH`, `UPTASK_LOG_LEVEL` and `UPTASK_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            db_path: db_path_from_lookup(&lookup),
            ..Self::default()
        };
        if let Some(level) = non_blank(LOG_LEVEL_ENV) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        config.log_dir = non_blank(LOG_DIR_ENV).map(PathBuf::from);
        Ok(config)
    }

    /// Overrides the log level, e.g. from a command-line flag.
    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(self)
    }

    /// Starts file logging when `log_dir` is set; returns whether it did.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        init_logging(self.log_level, &dir.to_string_lossy())?;
        Ok(true)
    }
}

/// Database path from `UPTASK_DB_PATH` alone; logging settings are not read.
pub fn db_path_from_env() -> PathBuf {
    db_path_from_lookup(|key| std::env::var(key).ok())
}

/// Same as `db_path_from_env` with an injectable variable lookup.
pub fn db_path_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(DB_PATH_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map_or_else(default_db_path, PathBuf::from)
}

/// `<temp dir>/uptask.sqlite3`.
pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{
        db_path_from_lookup, default_db_path, ConfigError, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV,
        LOG_LEVEL_ENV,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config.db_path, default_db_path());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/data/tasks.db"),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, "/var/log/uptask"),
        ]))
        .expect("config");
        assert_eq!(config.db_path, PathBuf::from("/data/tasks.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/uptask")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "   "), (LOG_DIR_ENV, "")])).expect("config");
        assert_eq!(config.db_path, default_db_path());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn unsupported_level_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "loud")]))
            .expect_err("bad level");
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn db_path_ignores_logging_settings() {
        let path = db_path_from_lookup(lookup(&[
            (DB_PATH_ENV, " /data/tasks.db "),
            (LOG_LEVEL_ENV, "loud"),
        ]));
        assert_eq!(path, PathBuf::from("/data/tasks.db"));
        assert_eq!(db_path_from_lookup(lookup(&[])), default_db_path());
    }

    #[test]
    fn logging_stays_off_without_directory() {
        let config = CoreConfig::default();
        assert!(!config.init_logging().expect("no-op"));
    }
}
