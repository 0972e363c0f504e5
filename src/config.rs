//! Configuration loaded from an optional TOML file
//!
//! Every field has a default, so a missing file or a partial file is fine.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api/v1"
//! token = "..."
//!
//! [cache]
//! ttl_document_secs = 3600
//! ttl_final_secs = 86400
//!
//! [logging]
//! level = "debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheStore;

/// Errors raised while loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Report Fetch API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are appended to
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Timeout for the job posting metadata call
    pub job_post_timeout_secs: u64,
    /// Timeout for each report and interview call
    pub report_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            token: None,
            job_post_timeout_secs: 10,
            report_timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn job_post_timeout(&self) -> Duration {
        Duration::from_secs(self.job_post_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}

/// Cache location and per-kind TTLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for cache files; the XDG cache directory when unset
    pub dir: Option<PathBuf>,
    pub ttl_document_secs: u64,
    pub ttl_written_secs: u64,
    pub ttl_interview_secs: u64,
    pub ttl_final_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_document_secs: 3_600,
            ttl_written_secs: 3_600,
            ttl_interview_secs: 3_600,
            ttl_final_secs: 86_400,
        }
    }
}

impl CacheConfig {
    /// Opens the configured store, falling back to the XDG location
    pub fn store(&self) -> Option<CacheStore> {
        match &self.dir {
            Some(dir) => Some(CacheStore::with_dir(dir.clone())),
            None => CacheStore::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: "info")
    /// Options: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/hirecache/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "hirecache")?;
        Some(project_dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.api.job_post_timeout(), Duration::from_secs(10));
        assert_eq!(config.api.report_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache.ttl_final_secs, 86_400);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\ntoken = \"secret\"\n\n[cache]\nttl_written_secs = 60\ndir = \"/tmp/reports\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.api.report_timeout_secs, 15);
        assert_eq!(config.cache.ttl_written_secs, 60);
        assert_eq!(config.cache.ttl_document_secs, 3_600);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/reports")));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[cache]\nttl_final_secs = \"soon\"\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_cache_store_uses_configured_dir() {
        let config = CacheConfig {
            dir: Some(PathBuf::from("/var/tmp/hirecache-test")),
            ..CacheConfig::default()
        };
        let store = config.store().unwrap();
        assert_eq!(store.dir(), &PathBuf::from("/var/tmp/hirecache-test"));
    }
}
