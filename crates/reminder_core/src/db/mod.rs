//! Reminder store bootstrap.
//!
//! # Responsibility
//! - Open SQLite connections and bring the `reminders` schema up to date.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; a newer file is refused
//!   rather than read with a stale row layout.
//! - Every row carries both `fire_at_ms` (next registered instant) and
//!   `anchor_ms` (user-picked instant); rows migrated from the first schema
//!   get `anchor_ms = fire_at_ms`.
//! - Callers never see a connection whose migrations failed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap failure for the reminder store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "reminder store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
