//! Forward-only SQL migrations.
//!
//! Migrations are `.sql` files in one directory, applied in file-name order.
//! Each file's name is its id; once an id is in the `migrations` ledger it is
//! never applied again, even if the file changes.
//!
//! ```rust,no_run
//! use selma::migrate::{Migrator, load_migrations};
//! use selma::persist::Database;
//! use selma::config::DatabaseConfig;
//!
//! let db = Database::open(&DatabaseConfig::new("data/app.db"))?;
//! let migrations = load_migrations("migrations")?;
//! let report = Migrator::new().apply(&db, &migrations)?;
//! println!("applied {:?}, skipped {:?}", report.applied, report.skipped);
//! # Ok::<(), selma::Error>(())
//! ```
//!
//! # Single writer
//!
//! [`Migrator::apply`] holds the connection lock for the whole run, so nothing
//! else in the process can use that [`Database`] meanwhile. Each migration
//! runs in its own `BEGIN IMMEDIATE` transaction, which takes SQLite's write
//! lock *before* the ledger check; a second process running the same
//! migrations waits, then sees the ledger row and skips. For the same reason
//! a migration script must not contain its own `BEGIN` / `COMMIT`.

use std::fs;
use std::path::Path;

use rusqlite::TransactionBehavior;
use tracing::{Span, error, info, info_span};

use crate::error::MigrationError;
use crate::persist::Database;

const MIGRATION_SUFFIX: &str = "sql";

const CREATE_LEDGER: &str = "
    CREATE TABLE IF NOT EXISTS migrations (
        id         TEXT PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
";
const IS_APPLIED: &str = "SELECT EXISTS(SELECT 1 FROM migrations WHERE id = ?1)";
const RECORD_APPLIED: &str = "INSERT INTO migrations (id) VALUES (?1)";
const LIST_APPLIED: &str = "SELECT id, applied_at FROM migrations ORDER BY id";

/// One migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The file name, e.g. `001_init.sql`.
    pub id: String,
    /// The forward script.
    pub up: String,
}

/// What one [`Migrator::apply`] run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// A ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub id: String,
    pub applied_at: String,
}

/// Reads every `*.sql` file directly inside `dir`, sorted by file name.
///
/// Subdirectories, other extensions and names that are not valid UTF-8 are
/// ignored.
pub fn load_migrations(dir: impl AsRef<Path>) -> Result<Vec<Migration>, MigrationError> {
    let dir = dir.as_ref();
    let read_dir_err = |source| MigrationError::ReadDir { path: dir.to_path_buf(), source };

    let mut migrations = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != MIGRATION_SUFFIX) {
            continue;
        }
        let Some(id) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let up = fs::read_to_string(&path)
            .map_err(|source| MigrationError::ReadFile { path: path.clone(), source })?;
        migrations.push(Migration { id: id.to_owned(), up });
    }

    migrations.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(migrations)
}

/// Applies migrations against a [`Database`], at most once each.
#[derive(Debug, Clone)]
pub struct Migrator {
    span: Span,
}

impl Migrator {
    pub fn new() -> Self {
        Self { span: info_span!("migrator") }
    }

    /// Replaces the span that this migrator's events are logged under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Applies, in order, every migration whose id is not yet in the ledger.
    ///
    /// Stops at the first failing script. That migration leaves no trace:
    /// neither its partial effects nor a ledger row. The ones after it are not
    /// attempted, so the next run retries exactly that migration first.
    pub fn apply(&self, db: &Database, migrations: &[Migration]) -> Result<Report, MigrationError> {
        let mut conn = db.lock();
        conn.execute_batch(CREATE_LEDGER)?;

        let mut report = Report::default();
        for migration in migrations {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let applied: bool = tx.query_row(IS_APPLIED, [&migration.id], |row| row.get(0))?;
            if applied {
                info!(parent: &self.span, id = %migration.id, "migration already applied, skipping");
                report.skipped.push(migration.id.clone());
                continue;
            }

            if let Err(source) = tx.execute_batch(&migration.up) {
                error!(parent: &self.span, id = %migration.id, error = %source, "migration failed");
                return Err(MigrationError::Script { id: migration.id.clone(), source });
            }
            tx.execute(RECORD_APPLIED, [&migration.id])?;
            tx.commit()?;

            info!(parent: &self.span, id = %migration.id, "migration applied");
            report.applied.push(migration.id.clone());
        }
        Ok(report)
    }

    /// Lists the ledger, ordered by id. Empty if no run ever happened.
    pub fn applied(&self, db: &Database) -> Result<Vec<AppliedMigration>, MigrationError> {
        let conn = db.lock();
        conn.execute_batch(CREATE_LEDGER)?;
        let mut stmt = conn.prepare(LIST_APPLIED)?;
        let rows = stmt.query_map([], |row| {
            Ok(AppliedMigration { id: row.get(0)?, applied_at: row.get(1)? })
        })?;
        let applied = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(applied)
    }
}

impl Default for Migrator {
    fn default() -> Self { Self::new() }
}
