//! The [`Record`] trait: by-name access to a struct's fields.
//!
//! Rust has no runtime reflection, so a record type declares its fields once
//! and exposes them by name. The [`record!`](crate::record) macro writes that
//! impl for a plain struct:
//!
//! ```rust
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! selma::record!(User { id, name, email });
//! ```

use std::collections::BTreeMap;

use rusqlite::types::{FromSql, ToSql, ToSqlOutput, Value, ValueRef};

use crate::error::PersistError;

/// Column name to value. Ordered, so generated SQL is deterministic.
pub type Values = BTreeMap<String, Value>;

/// A struct whose fields map 1:1 onto table columns.
pub trait Record {
    /// Declared field names.
    const FIELDS: &'static [&'static str];

    /// Column for `field`. Defaults to the lower-cased field name.
    fn column(field: &str) -> String {
        field.to_lowercase()
    }

    fn get(&self, field: &str) -> Result<Value, PersistError>;

    fn set(&mut self, field: &str, value: Value) -> Result<(), PersistError>;
}

/// Converts any [`ToSql`] field value into an owned [`Value`].
pub fn encode<T: ToSql + ?Sized>(field: &str, value: &T) -> Result<Value, PersistError> {
    let encode_err = |source| PersistError::Encode { field: field.to_owned(), source };
    match value.to_sql().map_err(encode_err)? {
        ToSqlOutput::Borrowed(v) => Ok(Value::from(v)),
        ToSqlOutput::Owned(v) => Ok(v),
        _ => Err(encode_err(rusqlite::Error::ToSqlConversionFailure(
            "value does not reduce to a plain SQLite value".into(),
        ))),
    }
}

/// Converts a column [`Value`] into the field's type.
pub fn decode<T: FromSql>(field: &str, value: Value) -> Result<T, PersistError> {
    T::column_result(ValueRef::from(&value))
        .map_err(|source| PersistError::Decode { field: field.to_owned(), source })
}

/// Renders a value for log lines and error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} byte blob>", b.len()),
    }
}

/// Implements [`Record`] for a struct by listing its fields.
///
/// Each listed field must implement [`ToSql`] and [`FromSql`]. Columns are
/// the lower-cased field names.
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::persist::Record for $ty {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn get(
                &self,
                field: &str,
            ) -> ::std::result::Result<$crate::persist::Value, $crate::PersistError> {
                match field {
                    $(stringify!($field) => $crate::persist::encode(field, &self.$field),)+
                    other => ::std::result::Result::Err(
                        $crate::PersistError::UnknownField(other.to_owned()),
                    ),
                }
            }

            fn set(
                &mut self,
                field: &str,
                value: $crate::persist::Value,
            ) -> ::std::result::Result<(), $crate::PersistError> {
                match field {
                    $(stringify!($field) => {
                        self.$field = $crate::persist::decode(field, value)?;
                        ::std::result::Result::Ok(())
                    })+
                    other => ::std::result::Result::Err(
                        $crate::PersistError::UnknownField(other.to_owned()),
                    ),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Note {
        id: i64,
        body: String,
        pinned: bool,
        score: Option<f64>,
    }

    crate::record!(Note { id, body, pinned, score });

    #[test]
    fn fields_are_declared_in_order() {
        assert_eq!(Note::FIELDS, ["id", "body", "pinned", "score"]);
        assert_eq!(Note::column("Body"), "body");
    }

    #[test]
    fn get_encodes_by_name() {
        let note = Note { id: 3, body: "hi".into(), pinned: true, score: None };
        assert_eq!(note.get("id").unwrap(), Value::Integer(3));
        assert_eq!(note.get("body").unwrap(), Value::Text("hi".into()));
        assert_eq!(note.get("pinned").unwrap(), Value::Integer(1));
        assert_eq!(note.get("score").unwrap(), Value::Null);
        assert!(matches!(note.get("nope"), Err(PersistError::UnknownField(f)) if f == "nope"));
    }

    #[test]
    fn set_decodes_by_name() {
        let mut note = Note::default();
        note.set("body", Value::Text("saved".into())).unwrap();
        note.set("score", Value::Real(0.5)).unwrap();
        note.set("pinned", Value::Integer(0)).unwrap();

        assert_eq!(note, Note { id: 0, body: "saved".into(), pinned: false, score: Some(0.5) });
    }

    #[test]
    fn set_with_wrong_type_is_a_decode_error() {
        let mut note = Note::default();
        let err = note.set("id", Value::Text("seven".into())).unwrap_err();
        assert!(matches!(err, PersistError::Decode { ref field, .. } if field == "id"), "{err}");
    }

    #[test]
    fn describe_renders_ids() {
        assert_eq!(describe(&Value::Integer(42)), "42");
        assert_eq!(describe(&Value::Text("abc".into())), "abc");
        assert_eq!(describe(&Value::Null), "NULL");
    }
}
