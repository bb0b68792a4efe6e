//! Logging bootstrap.
//!
//! Components never redirect output themselves. Each one logs through
//! `tracing`, under a span it owns (see `with_span` on [`Router`](crate::Router),
//! [`Mapper`](crate::persist::Mapper) and [`Migrator`](crate::migrate::Migrator)).
//! [`init`] installs the one process-wide subscriber that decides where those
//! events go:
//!
//! | Sink | Receives |
//! |---|---|
//! | console | `RUST_LOG`, or `debug` in development / `info` in production |
//! | `system` file | everything at `info` and above |
//! | `middleware` file | events from `selma::middleware` at `info` and above |
//! | `debug` file | everything at `debug` and above, development only |

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt;

use crate::config::{LoggingConfig, Mode};
use crate::error::{Error, Result};

const MIDDLEWARE_TARGET: &str = "selma::middleware";

/// Installs the global subscriber. Call once, before anything is logged.
///
/// # Errors
///
/// Fails if the log directory or a log file cannot be created, or if a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig, mode: Mode) -> Result<()> {
    let default_level = match mode {
        Mode::Development => "debug",
        Mode::Production => "info",
    };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fs::create_dir_all(&config.directory)?;
    let system = open_log(&config.directory, config.system.as_deref())?;
    let middleware = open_log(&config.directory, config.middleware.as_deref())?;
    let debug = match mode {
        Mode::Development => open_log(&config.directory, config.debug.as_deref())?,
        Mode::Production => None,
    };

    let system_layer = system.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::INFO)
    });
    let middleware_layer = middleware.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(Targets::new().with_target(MIDDLEWARE_TARGET, Level::INFO))
    });
    let debug_layer = debug.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(system_layer)
        .with(middleware_layer)
        .with(debug_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Opens `dir/name` for appending, or `None` when the file is disabled.
fn open_log(dir: &Path, name: Option<&str>) -> Result<Option<File>> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    let file = OpenOptions::new().create(true).append(true).open(dir.join(name))?;
    Ok(Some(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_and_empty_names_open_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_log(dir.path(), None).unwrap().is_none());
        assert!(open_log(dir.path(), Some("")).unwrap().is_none());
    }

    #[test]
    fn log_files_are_created_for_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.log");
        fs::write(&path, "earlier line\n").unwrap();

        let file = open_log(dir.path(), Some("system.log")).unwrap();

        assert!(file.is_some());
        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier line\n");
    }
}
