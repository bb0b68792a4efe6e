//! Error types.
//!
//! Application-level failures (404, 403, …) are HTTP [`Response`](crate::Response)
//! values, not `Error`s. A route miss never becomes an error value at all:
//! the router answers it with `404 Not Found`.
//!
//! The types here cover everything else: binding a port, reading the config
//! file, talking to the store, applying migrations and rendering views.

use std::path::PathBuf;

use thiserror::Error;

/// The crate-level error, returned by [`App`](crate::App) and [`Server`](crate::Server).
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    View(#[from] ViewError),

    /// The tracing subscriber could not be installed.
    #[error("logging: {0}")]
    Logging(String),
}

/// Failure while loading the JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure in the record mapper.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The lookup matched zero rows.
    #[error("no row in `{table}` with id {id}")]
    NotFound { table: String, id: String },

    /// The store rejected a statement or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cannot upsert a record with no columns")]
    EmptyRecord,

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid identifier '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    #[error("record has no field named '{0}'")]
    UnknownField(String),

    #[error("cannot decode column for field '{field}': {source}")]
    Decode {
        field: String,
        #[source]
        source: rusqlite::types::FromSqlError,
    },

    #[error("cannot encode field '{field}': {source}")]
    Encode {
        field: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Failure while loading or applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to read migrations directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read migration file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating, querying or writing the `migrations` ledger failed.
    #[error("migration ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    /// The forward script of `id` failed; nothing of it was kept.
    #[error("failed to run migration {id}: {source}")]
    Script {
        id: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Failure while loading or rendering HTML views.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to read views directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read view {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("failed to render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Convenience alias for results with the crate-level [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
