//! User registration and preferences service.

use super::{normalize_name, ServiceError, ServiceResult};
use crate::access::ActingContext;
use crate::model::scope::UserId;
use crate::model::user::{User, UserPreferences};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;
use rusqlite::Connection;
use serde_json::{Map, Value};

/// User service facade.
pub struct UserService<U: UserRepository> {
    repo: U,
}

/// Service wired to one SQLite connection.
pub type SqliteUserService<'conn> = UserService<SqliteUserRepository<'conn>>;

impl<'conn> SqliteUserService<'conn> {
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(SqliteUserRepository::try_new(conn)?))
    }
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    /// Registers a new user. Emails are unique case-insensitively.
    pub fn register(&self, name: &str, email: &str) -> ServiceResult<User> {
        let name = normalize_name(name).ok_or_else(|| ServiceError::InvalidName(name.to_string()))?;
        if !is_plausible_email(email) {
            return Err(ServiceError::InvalidEmail(email.to_string()));
        }

        let user = self.repo.create_user(&name, email)?;
        info!("event=user_register module=service status=ok user={}", user.id);
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(id)?
            .ok_or_else(|| ServiceError::UserNotFound(id.to_string()))
    }

    pub fn preferences(&self, ctx: &ActingContext) -> ServiceResult<UserPreferences> {
        Ok(self.repo.get_preferences(ctx.user_id)?)
    }

    /// Merges `patch` into the acting user's preferences; `null` removes a key.
    pub fn update_preferences(
        &self,
        ctx: &ActingContext,
        patch: &Map<String, Value>,
    ) -> ServiceResult<UserPreferences> {
        Ok(self.repo.update_preferences(ctx.user_id, patch)?)
    }
}

/// One `@` with non-empty sides and a dotted domain.
fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
