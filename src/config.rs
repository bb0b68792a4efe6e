//! Application configuration, loaded from a JSON file.
//!
//! Every field has a default, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "mode": "development",
//!   "server_port": 8080,
//!   "migrations_dir": "migrations",
//!   "views_dir": null,
//!   "logging": {
//!     "directory": "logs",
//!     "system": "system.log",
//!     "middleware": "middleware.log",
//!     "debug": "debug.log"
//!   },
//!   "database": { "path": "data/app.db", "busy_timeout_ms": 5000 }
//! }
//! ```
//!
//! Setting a log file name to `null` disables that file. `views_dir` is
//! optional; without it the app loads no HTML views.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Run mode. Development additionally writes debug-level output to the debug log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub server_port: u16,
    pub migrations_dir: PathBuf,
    /// Directory of `*.html` templates, loaded at startup when set.
    pub views_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            server_port: 8080,
            migrations_dir: PathBuf::from("migrations"),
            views_dir: None,
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Log file names, relative to `directory`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// Everything at `info` and above.
    pub system: Option<String>,
    /// Request logs from [`middleware::log_requests`](crate::middleware::log_requests).
    pub middleware: Option<String>,
    /// Everything at `debug` and above; development mode only.
    pub debug: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            system: Some("system.log".to_owned()),
            middleware: Some("middleware.log".to_owned()),
            debug: Some("debug.log".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file. Parent directories are created on open.
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), ..Self::default() }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("data/app.db"), busy_timeout_ms: 5000 }
    }
}

impl Config {
    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_port == 0 {
            return Err(ConfigError::Invalid("server_port must be non-zero".into()));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    /// Listen address: all interfaces on `server_port`.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.server_port))
    }
}
