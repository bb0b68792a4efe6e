//! Record persistence over SQLite.
//!
//! A [`Record`] declares its fields; a [`Mapper`] binds one record type to one
//! table and offers two operations:
//!
//! - [`Mapper::upsert`]: insert, or overwrite the mapped columns of the row
//!   with the same `id`;
//! - [`Mapper::find_by_id`]: load one row, each column bound to its field by
//!   name.
//!
//! The free functions [`upsert`] and [`find_by_id`] do the same without a
//! registered mapper, the former on a raw column→value map.
//!
//! All operations block on SQLite I/O. Call them from
//! `tokio::task::spawn_blocking` if a handler must not stall its worker.

mod database;
mod mapper;
mod record;
pub mod sql;

pub use database::Database;
pub use mapper::{Mapper, Mapping, find_by_id, upsert};
pub use record::{Record, Values, decode, encode};
pub use rusqlite::types::Value;

pub use crate::error::PersistError;
