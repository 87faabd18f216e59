//! Journal store bootstrap.
//!
//! Connections leave this module configured and migrated; everything above
//! it assumes the journal schema is present.
//!
//! # Invariants
//! - The applied schema version lives in `PRAGMA user_version`.
//! - A store written by a newer build is never opened.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Store failures, split by the bootstrap step that hit them.
#[derive(Debug)]
pub enum DbError {
    /// The database could not be opened or created at `location`.
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// A required connection pragma was rejected.
    Pragma {
        pragma: &'static str,
        source: rusqlite::Error,
    },
    /// Migration `version` failed; the store stays at its previous version.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    SchemaTooNew {
        found: u32,
        supported: u32,
    },
    /// A statement failed on a bootstrapped connection.
    Sqlite(rusqlite::Error),
}

impl DbError {
    fn sqlite_source(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Open { source, .. }
            | Self::Pragma { source, .. }
            | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }

    /// Another writer held the store lock past the busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.sqlite_source(),
            Some(rusqlite::Error::SqliteFailure(err, _))
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open journal store at {location}: {source}")
            }
            Self::Pragma { pragma, source } => {
                write!(f, "journal store rejected pragma {pragma}: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "journal migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "journal schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.sqlite_source().map(|err| err as &(dyn Error + 'static))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
