use crate::db::DbError;
use crate::model::bullet::{BulletId, BulletValidationError};
use crate::model::scope::{CollectionId, Scope, UserId};
use crate::ordering::InvalidOrderReason;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from journal repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Input rejected before persistence.
    Validation(BulletValidationError),
    /// Collection row or daily-log owner does not exist.
    ScopeNotFound(Scope),
    BulletNotFound(BulletId),
    UserNotFound(UserId),
    /// Requested order does not describe members of the scope.
    InvalidOrder(InvalidOrderReason),
    /// Email is already registered.
    EmailTaken(String),
    AlreadyMember {
        collection_id: CollectionId,
        user_id: UserId,
    },
    MemberNotFound {
        collection_id: CollectionId,
        user_id: UserId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ScopeNotFound(scope) => write!(f, "scope not found: {scope}"),
            Self::BulletNotFound(id) => write!(f, "bullet not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidOrder(reason) => write!(f, "invalid order: {reason}"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::AlreadyMember {
                collection_id,
                user_id,
            } => write!(
                f,
                "user {user_id} is already a member of collection {collection_id}"
            ),
            Self::MemberNotFound {
                collection_id,
                user_id,
            } => write!(
                f,
                "user {user_id} is not a member of collection {collection_id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "journal repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "journal repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted journal data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<BulletValidationError> for RepoError {
    fn from(value: BulletValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidOrderReason> for RepoError {
    fn from(value: InvalidOrderReason) -> Self {
        Self::InvalidOrder(value)
    }
}
