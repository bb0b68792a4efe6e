//! Every SQL string the record mapper sends is built here.
//!
//! Values always travel as bound parameters. Table and column names cannot be
//! bound, so they are checked against a plain identifier grammar instead.

use crate::error::PersistError;

/// The identifier column every mapped table carries.
pub const ID_COLUMN: &str = "id";

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), PersistError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistError::InvalidIdentifier(name.to_owned()))
    }
}

/// `INSERT ... ON CONFLICT(id) DO UPDATE` for the given columns, in order.
///
/// Placeholder `?n` binds the n-th column. The update clause rewrites every
/// supplied column except `id`; with nothing else to write it degrades to
/// `DO NOTHING`.
pub fn upsert(table: &str, columns: &[&str]) -> Result<String, PersistError> {
    if columns.is_empty() {
        return Err(PersistError::EmptyRecord);
    }
    validate_identifier(table)?;
    for column in columns {
        validate_identifier(column)?;
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != ID_COLUMN)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();
    let on_conflict = if updates.is_empty() {
        "DO NOTHING".to_owned()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT({ID_COLUMN}) {on_conflict}",
        columns.join(", "),
        placeholders.join(", "),
    ))
}

/// `SELECT <columns> FROM <table> WHERE id = ?1`.
pub fn select_by_id(table: &str, columns: &[&str]) -> Result<String, PersistError> {
    if columns.is_empty() {
        return Err(PersistError::EmptyRecord);
    }
    validate_identifier(table)?;
    for column in columns {
        validate_identifier(column)?;
    }
    Ok(format!(
        "SELECT {} FROM {table} WHERE {ID_COLUMN} = ?1",
        columns.join(", "),
    ))
}
