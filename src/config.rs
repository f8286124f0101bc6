//! Application configuration
//!
//! Built once at startup and shared by `Arc`. Every field has a default, so an
//! absent config file and `{}` give the same configuration.
//!
//! ```json
//! {
//!   "data_root": "./data",
//!   "backup_root": "./backup",
//!   "retention_limit": 50,
//!   "global_format": "tar.gz",
//!   "scope_format": "zip",
//!   "log_level": "info",
//!   "server": { "host": "127.0.0.1", "port": 8080 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backup::{ArchiveFormat, DEFAULT_RETENTION_LIMIT};
use crate::cli::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Live note store root (default: "./data")
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Archive root (default: "./backup")
    #[serde(default = "default_backup_root")]
    pub backup_root: PathBuf,

    /// Archives kept per scope (default: 50)
    #[serde(default = "default_retention_limit")]
    pub retention_limit: usize,

    /// Format of whole-store archives (default: "tar.gz")
    #[serde(default = "default_global_format")]
    pub global_format: ArchiveFormat,

    /// Format of per-scope archives (default: "zip")
    #[serde(default = "default_scope_format")]
    pub scope_format: ArchiveFormat,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: HttpServerConfig,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}
fn default_backup_root() -> PathBuf {
    PathBuf::from("backup")
}
fn default_retention_limit() -> usize {
    DEFAULT_RETENTION_LIMIT
}
fn default_global_format() -> ArchiveFormat {
    ArchiveFormat::TarGz
}
fn default_scope_format() -> ArchiveFormat {
    ArchiveFormat::Zip
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            backup_root: default_backup_root(),
            retention_limit: default_retention_limit(),
            global_format: default_global_format(),
            scope_format: default_scope_format(),
            log_level: default_log_level(),
            server: HttpServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Config rooted at the given directories, everything else default
    pub fn with_roots(data_root: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            backup_root: backup_root.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject configurations the backup core cannot work with
    pub fn validate(&self) -> CliResult<()> {
        if self.retention_limit == 0 {
            return Err(CliError::config_error("retention_limit must be > 0"));
        }

        if self.data_root.file_name().is_none() {
            return Err(CliError::config_error(format!(
                "data_root must name a directory: '{}'",
                self.data_root.display()
            )));
        }

        if self.backup_root.starts_with(&self.data_root) {
            return Err(CliError::config_error(
                "backup_root must not be inside data_root",
            ));
        }

        if self.data_root.starts_with(&self.backup_root) {
            return Err(CliError::config_error(
                "data_root must not be inside backup_root",
            ));
        }

        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|e| CliError::config_error(e))
    }
}
