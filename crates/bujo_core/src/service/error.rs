use crate::access::{Ability, AccessError};
use crate::model::bullet::{BulletId, BulletValidationError};
use crate::model::scope::{CollectionId, Scope, UserId};
use crate::ordering::InvalidOrderReason;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for journal use-cases.
#[derive(Debug)]
pub enum ServiceError {
    InvalidContent(BulletValidationError),
    /// Collection or user name is blank or too long.
    InvalidName(String),
    InvalidEmail(String),
    /// Update request carries no field to change.
    EmptyUpdate,
    /// Daily log owner does not exist.
    ScopeNotFound(Scope),
    CollectionNotFound(CollectionId),
    BulletNotFound(BulletId),
    /// Lookup key (id or email) did not match a user.
    UserNotFound(String),
    MemberNotFound {
        collection_id: CollectionId,
        user_id: UserId,
    },
    AlreadyMember {
        collection_id: CollectionId,
        user_id: UserId,
    },
    /// Owner cannot be added as a member of their own collection.
    CannotShareWithOwner(CollectionId),
    EmailTaken(String),
    InvalidOrder(InvalidOrderReason),
    Unauthorized {
        user_id: UserId,
        scope: Scope,
        ability: Ability,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Whether the error names a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ScopeNotFound(_)
                | Self::CollectionNotFound(_)
                | Self::BulletNotFound(_)
                | Self::UserNotFound(_)
                | Self::MemberNotFound { .. }
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContent(err) => write!(f, "{err}"),
            Self::InvalidName(value) => write!(f, "invalid name: `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email: `{value}`"),
            Self::EmptyUpdate => write!(f, "update must change at least one field"),
            Self::ScopeNotFound(scope) => write!(f, "scope not found: {scope}"),
            Self::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            Self::BulletNotFound(id) => write!(f, "bullet not found: {id}"),
            Self::UserNotFound(key) => write!(f, "user not found: {key}"),
            Self::MemberNotFound {
                collection_id,
                user_id,
            } => write!(
                f,
                "user {user_id} is not a member of collection {collection_id}"
            ),
            Self::AlreadyMember {
                collection_id,
                user_id,
            } => write!(
                f,
                "user {user_id} is already a member of collection {collection_id}"
            ),
            Self::CannotShareWithOwner(id) => {
                write!(f, "collection {id} cannot be shared with its owner")
            }
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::InvalidOrder(reason) => write!(f, "invalid order: {reason}"),
            Self::Unauthorized {
                user_id,
                scope,
                ability,
            } => write!(
                f,
                "user {user_id} is not allowed to {} {scope}",
                ability.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidContent(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidContent(err),
            RepoError::ScopeNotFound(scope) => scope_not_found(scope),
            RepoError::BulletNotFound(id) => Self::BulletNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id.to_string()),
            RepoError::InvalidOrder(reason) => Self::InvalidOrder(reason),
            RepoError::EmailTaken(email) => Self::EmailTaken(email),
            RepoError::AlreadyMember {
                collection_id,
                user_id,
            } => Self::AlreadyMember {
                collection_id,
                user_id,
            },
            RepoError::MemberNotFound {
                collection_id,
                user_id,
            } => Self::MemberNotFound {
                collection_id,
                user_id,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<AccessError> for ServiceError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Denied {
                user_id,
                scope,
                ability,
            } => Self::Unauthorized {
                user_id,
                scope,
                ability,
            },
            AccessError::ScopeNotFound(scope) => scope_not_found(scope),
            AccessError::Db(err) => Self::Repo(RepoError::Db(err)),
        }
    }
}

impl From<BulletValidationError> for ServiceError {
    fn from(value: BulletValidationError) -> Self {
        Self::InvalidContent(value)
    }
}

fn scope_not_found(scope: Scope) -> ServiceError {
    match scope {
        Scope::Collection { collection_id } => ServiceError::CollectionNotFound(collection_id),
        other => ServiceError::ScopeNotFound(other),
    }
}
