//! Application configuration.
//!
//! # Responsibility
//! - Load `AppConfig` from an optional TOML file.
//! - Apply `BUJO_*` environment overrides on top of the file values.
//! - Validate the merged result before anything opens a database or socket.
//!
//! # Invariants
//! - Missing keys take their defaults; unknown keys are rejected.
//! - Environment values win over file values.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_PATH: &str = "BUJO_DATABASE_PATH";
pub const ENV_BIND_ADDR: &str = "BUJO_BIND_ADDR";
pub const ENV_LOG_LEVEL: &str = "BUJO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BUJO_LOG_DIR";
pub const ENV_REGISTRATION_ENABLED: &str = "BUJO_REGISTRATION_ENABLED";

const DEFAULT_DATABASE_PATH: &str = "bujo.sqlite3";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Merged runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file path.
    pub database_path: PathBuf,
    pub bind_addr: String,
    /// Whether `/register` accepts new users.
    pub registration_enabled: bool,
    pub log_level: String,
    /// Rolling log directory; stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            registration_enabled: false,
            log_level: LogLevel::build_default().as_str().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads the file (when given), applies process env overrides, validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable env lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&contents).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })
    }

    fn apply_env_overrides<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = value;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_REGISTRATION_ENABLED) {
            self.registration_enabled =
                parse_flag(&value).ok_or_else(|| ConfigError::InvalidEnv {
                    key: ENV_REGISTRATION_ENABLED,
                    value,
                })?;
        }
        Ok(())
    }

    /// Checks values that would otherwise fail late at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database_path",
                reason: "must not be empty".to_string(),
            });
        }
        self.socket_addr()?;
        if LogLevel::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unsupported level `{}`", self.log_level),
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "log_dir",
                    reason: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                field: "bind_addr",
                reason: format!("`{}`: {err}", self.bind_addr),
            })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration load failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        message: String,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
    InvalidEnv {
        key: &'static str,
        value: String,
    },
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "failed to parse config `{}`: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "failed to parse config: {message}"),
            Self::InvalidEnv { key, value } => write!(f, "invalid value for {key}: `{value}`"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, ENV_BIND_ADDR, ENV_REGISTRATION_ENABLED};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_keep_registration_closed() {
        let config = AppConfig::load_with_env(None, env_from(&[])).unwrap();
        assert!(!config.registration_enabled);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn file_values_fill_missing_keys_with_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            database_path = "/var/lib/bujo/journal.sqlite3"
            registration_enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/bujo/journal.sqlite3")
        );
        assert!(config.registration_enabled);
        assert_eq!(config.bind_addr, AppConfig::default().bind_addr);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("registration = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"127.0.0.1:9000\"").unwrap();
        writeln!(file, "registration_enabled = true").unwrap();

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env_from(&[
                (ENV_BIND_ADDR, " 0.0.0.0:3000 "),
                (ENV_REGISTRATION_ENABLED, "off"),
            ]),
        )
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(!config.registration_enabled);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = AppConfig::load_with_env(None, env_from(&[(ENV_BIND_ADDR, "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bind_addr", .. }));

        let err = AppConfig::load_with_env(
            None,
            env_from(&[(ENV_REGISTRATION_ENABLED, "maybe")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));

        let config = AppConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { field: "log_dir", .. }
        ));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::load_with_env(Some(&path), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
