//! Upsert and lookup-by-id over a record's declared columns.

use std::fmt;
use std::marker::PhantomData;

use rusqlite::OptionalExtension;
use rusqlite::types::Value;
use tracing::{Span, debug, info_span};

use super::database::Database;
use super::record::{Record, Values, describe};
use super::sql::{self, ID_COLUMN};
use crate::error::PersistError;

/// Inserts `values` into `table`, or overwrites the supplied columns of the
/// row with the same `id`.
///
/// Columns missing from `values` are left untouched on update.
pub fn upsert(db: &Database, table: &str, values: &Values) -> Result<(), PersistError> {
    let columns: Vec<&str> = values.keys().map(String::as_str).collect();
    let statement = sql::upsert(table, &columns)?;

    let changed = db
        .lock()
        .execute(&statement, rusqlite::params_from_iter(values.values()))?;
    debug!(table, columns = columns.len(), changed, "upsert");
    Ok(())
}

/// Loads the row with `id` from `table` into a fresh `R`.
///
/// Convenience for one-off lookups; register a [`Mapper`] to reuse the
/// mapping across calls.
pub fn find_by_id<R: Record + Default>(
    db: &Database,
    table: &str,
    id: impl Into<Value>,
) -> Result<R, PersistError> {
    Mapper::<R>::new(table)?.find_by_id(db, id)
}

/// The ordered (field, column) pairs of one record type in one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    table: String,
    pairs: Vec<(&'static str, String)>,
}

impl Mapping {
    /// Builds and validates the mapping of `R` onto `table`.
    ///
    /// # Errors
    ///
    /// [`PersistError::InvalidIdentifier`] for a bad table or column name;
    /// [`PersistError::UnknownField`] when no field maps to the `id` column.
    pub fn of<R: Record>(table: &str) -> Result<Self, PersistError> {
        sql::validate_identifier(table)?;
        let pairs: Vec<(&'static str, String)> = R::FIELDS
            .iter()
            .map(|field| (*field, R::column(field)))
            .collect();
        for (_, column) in &pairs {
            sql::validate_identifier(column)?;
        }
        if !pairs.iter().any(|(_, column)| column == ID_COLUMN) {
            return Err(PersistError::UnknownField(ID_COLUMN.to_owned()));
        }
        Ok(Self { table: table.to_owned(), pairs })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.pairs.iter().map(|(field, column)| (*field, column.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.pairs.iter().map(|(_, column)| column.as_str())
    }
}

/// Persists records of type `R` in one table.
///
/// Construct once (typically at startup, next to route registration) and
/// share; the mapping and SELECT statement are computed here and reused by
/// every call.
///
/// ```rust
/// use selma::persist::{Database, Mapper};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct User { id: i64, name: String }
/// selma::record!(User { id, name });
///
/// let db = Database::open_in_memory()?;
/// db.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")?;
///
/// let users = Mapper::<User>::new("users")?;
/// users.upsert(&db, &User { id: 1, name: "ada".into() })?;
/// assert_eq!(users.find_by_id(&db, 1)?.name, "ada");
/// # Ok::<(), selma::PersistError>(())
/// ```
pub struct Mapper<R> {
    mapping: Mapping,
    select: String,
    span: Span,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Mapper<R> {
    pub fn new(table: &str) -> Result<Self, PersistError> {
        let mapping = Mapping::of::<R>(table)?;
        let columns: Vec<&str> = mapping.columns().collect();
        let select = sql::select_by_id(table, &columns)?;
        let span = info_span!("mapper", table);
        Ok(Self { mapping, select, span, _record: PhantomData })
    }

    /// Replaces the span that this mapper's events are logged under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Reads every mapped field of `record` into column values.
    pub fn values(&self, record: &R) -> Result<Values, PersistError> {
        self.mapping
            .pairs()
            .map(|(field, column)| record.get(field).map(|value| (column.to_owned(), value)))
            .collect()
    }

    /// Inserts `record`, or overwrites its mapped columns if its id exists.
    pub fn upsert(&self, db: &Database, record: &R) -> Result<(), PersistError> {
        let values = self.values(record)?;
        self.span.in_scope(|| upsert(db, &self.mapping.table, &values))
    }

    /// Loads the row with `id`, binding each column to its field by name.
    ///
    /// # Errors
    ///
    /// [`PersistError::NotFound`] when no row has that id.
    pub fn find_by_id(&self, db: &Database, id: impl Into<Value>) -> Result<R, PersistError>
    where
        R: Default,
    {
        let id = id.into();
        let row = db
            .lock()
            .query_row(&self.select, [&id], |row| {
                self.mapping
                    .columns()
                    .map(|column| row.get::<_, Value>(column))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .optional()?;

        let Some(values) = row else {
            debug!(parent: &self.span, id = %describe(&id), "no row");
            return Err(PersistError::NotFound {
                table: self.mapping.table.clone(),
                id: describe(&id),
            });
        };

        let mut record = R::default();
        for ((field, _), value) in self.mapping.pairs().zip(values) {
            record.set(field, value)?;
        }
        Ok(record)
    }
}

impl<R> fmt::Debug for Mapper<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("mapping", &self.mapping)
            .field("select", &self.select)
            .finish()
    }
}
