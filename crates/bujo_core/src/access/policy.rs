use super::ability::Ability;
use crate::db::DbError;
use crate::model::scope::{Scope, UserId};
use log::warn;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Explicit identity of the user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingContext {
    pub user_id: UserId,
}

impl ActingContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Capability check failures.
#[derive(Debug)]
pub enum AccessError {
    Denied {
        user_id: UserId,
        scope: Scope,
        ability: Ability,
    },
    ScopeNotFound(Scope),
    Db(DbError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied {
                user_id,
                scope,
                ability,
            } => write!(
                f,
                "user {user_id} may not {} {scope}",
                ability.as_str()
            ),
            Self::ScopeNotFound(scope) => write!(f, "scope not found: {scope}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AccessError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Decides whether the acting user may perform `ability` on `scope`.
pub trait AccessPolicy {
    fn authorize(
        &self,
        ctx: &ActingContext,
        scope: &Scope,
        ability: Ability,
    ) -> Result<(), AccessError>;
}

/// Policy backed by collection ownership and membership rows.
///
/// - Collection owner: every ability.
/// - Shared member: `View` and `Update`.
/// - Daily log: only its own user, every ability.
pub struct StoreAccessPolicy<'conn> {
    conn: &'conn Connection,
}

impl<'conn> StoreAccessPolicy<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccessPolicy for StoreAccessPolicy<'_> {
    fn authorize(
        &self,
        ctx: &ActingContext,
        scope: &Scope,
        ability: Ability,
    ) -> Result<(), AccessError> {
        let allowed = match scope {
            Scope::DailyLog { user_id, .. } => *user_id == ctx.user_id,
            Scope::Collection { collection_id } => {
                let owner: Option<String> = self
                    .conn
                    .query_row(
                        "SELECT owner_id FROM collections WHERE id = ?1;",
                        [collection_id.to_string()],
                        |row| row.get(0),
                    )
                    .optional()?;
                let owner = owner.ok_or(AccessError::ScopeNotFound(*scope))?;
                if owner == ctx.user_id.to_string() {
                    true
                } else if ability.granted_to_members() {
                    let member: i64 = self.conn.query_row(
                        "SELECT EXISTS(
                            SELECT 1
                            FROM collection_users
                            WHERE collection_id = ?1
                              AND user_id = ?2
                        );",
                        [collection_id.to_string(), ctx.user_id.to_string()],
                        |row| row.get(0),
                    )?;
                    member == 1
                } else {
                    false
                }
            }
        };

        if allowed {
            return Ok(());
        }
        warn!(
            "event=access_denied module=access status=error user={} scope={scope} ability={}",
            ctx.user_id,
            ability.as_str()
        );
        Err(AccessError::Denied {
            user_id: ctx.user_id,
            scope: *scope,
            ability,
        })
    }
}
