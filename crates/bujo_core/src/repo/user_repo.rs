//! User and preference repository.
//!
//! # Invariants
//! - Emails are stored lower-cased and trimmed; lookups use the same form.
//! - Missing preference rows read as an empty object.

use super::sql::{begin_immediate, ensure_connection_ready, parse_uuid};
use super::{RepoError, RepoResult};
use crate::model::scope::UserId;
use crate::model::user::{User, UserPreferences};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Repository interface for users and their preferences.
pub trait UserRepository {
    fn create_user(&self, name: &str, email: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn get_preferences(&self, user_id: UserId) -> RepoResult<UserPreferences>;
    /// Merges `patch` into stored preferences and returns the result.
    fn update_preferences(
        &self,
        user_id: UserId,
        patch: &Map<String, Value>,
    ) -> RepoResult<UserPreferences>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "user_preferences"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, name: &str, email: &str) -> RepoResult<User> {
        let email = normalize_email(email);
        let id = Uuid::new_v4();

        let tx = begin_immediate(self.conn)?;
        if find_by_email(&tx, &email)?.is_some() {
            return Err(RepoError::EmailTaken(email));
        }
        tx.execute(
            "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3);",
            params![id.to_string(), name, email],
        )?;
        tx.commit()?;

        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, created_at
             FROM users
             WHERE id = ?1;",
        )?;
        stmt.query_row([id.to_string()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        find_by_email(self.conn, &normalize_email(email))
    }

    fn get_preferences(&self, user_id: UserId) -> RepoResult<UserPreferences> {
        load_preferences(self.conn, user_id)
    }

    fn update_preferences(
        &self,
        user_id: UserId,
        patch: &Map<String, Value>,
    ) -> RepoResult<UserPreferences> {
        let tx = begin_immediate(self.conn)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::UserNotFound(user_id));
        }

        let mut preferences = load_preferences(&tx, user_id)?;
        preferences.merge(patch);
        let encoded = serde_json::to_string(&preferences)
            .map_err(|err| RepoError::InvalidData(format!("unencodable preferences: {err}")))?;
        tx.execute(
            "INSERT INTO user_preferences (user_id, preferences)
             VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET
                preferences = excluded.preferences,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id.to_string(), encoded],
        )?;
        tx.commit()?;
        Ok(preferences)
    }
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn find_by_email(conn: &Connection, email: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, created_at
         FROM users
         WHERE email = ?1;",
    )?;
    stmt.query_row([email], |row| Ok(parse_user_row(row)))
        .optional()?
        .transpose()
}

fn load_preferences(conn: &Connection, user_id: UserId) -> RepoResult<UserPreferences> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT preferences FROM user_preferences WHERE user_id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match stored {
        None => Ok(UserPreferences::default()),
        Some(text) => serde_json::from_str(&text).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid json in user_preferences.preferences: {err}"
            ))
        }),
    }
}
