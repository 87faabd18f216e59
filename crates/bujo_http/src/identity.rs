//! Acting-user resolution.
//!
//! Sessions and credentials live outside this service. A provider only maps
//! request headers to a known user id.

use axum::http::HeaderMap;
use bujo_core::{DbError, UserId};
use log::debug;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Header carrying the authenticated user id from the fronting proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the acting user of a request.
pub trait IdentityProvider: Send + Sync {
    /// Returns `None` when the request carries no valid identity.
    fn identify(&self, headers: &HeaderMap, conn: &Connection) -> Result<Option<UserId>, DbError>;
}

/// Trusts `x-user-id` and checks it names a registered user.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentity;

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, headers: &HeaderMap, conn: &Connection) -> Result<Option<UserId>, DbError> {
        let Some(raw) = headers.get(USER_ID_HEADER) else {
            return Ok(None);
        };
        let Some(user_id) = raw
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
        else {
            debug!("event=identity_resolve module=http status=error error_code=malformed_header");
            return Ok(None);
        };

        let known: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE id = ?1;",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::Sqlite)?;
        Ok(known.map(|_| user_id))
    }
}
