//! Collection and sharing repository.
//!
//! # Invariants
//! - Deleting a collection cascades to its bullets and memberships through
//!   foreign keys; callers never delete bullets one by one for it.
//! - The owner is never stored as a member row.
//! - Listing is deterministic: `name ASC, id ASC`.

use super::sql::{begin_immediate, ensure_connection_ready, parse_uuid};
use super::user_repo::parse_user_row;
use super::{RepoError, RepoResult};
use crate::model::collection::Collection;
use crate::model::scope::{CollectionId, Scope, UserId};
use crate::model::user::User;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Repository interface for collections and their members.
pub trait CollectionRepository {
    fn create_collection(&self, owner_id: UserId, name: &str) -> RepoResult<Collection>;
    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>>;
    /// Collections owned by or shared with `user_id`.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Collection>>;
    fn rename_collection(&self, id: CollectionId, name: &str) -> RepoResult<Collection>;
    /// Deletes the collection with its bullets and memberships.
    fn delete_collection(&self, id: CollectionId) -> RepoResult<()>;
    fn list_members(&self, id: CollectionId) -> RepoResult<Vec<User>>;
    fn is_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<bool>;
    fn add_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<()>;
    fn remove_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<()>;
}

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCollectionRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["collections", "collection_users", "users"])?;
        Ok(Self { conn })
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn create_collection(&self, owner_id: UserId, name: &str) -> RepoResult<Collection> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO collections (id, owner_id, name) VALUES (?1, ?2, ?3);",
            params![id.to_string(), owner_id.to_string(), name],
        )?;
        load_required_collection(self.conn, id)
    }

    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>> {
        load_collection(self.conn, id)
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Collection>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.id AS id,
                c.owner_id AS owner_id,
                c.name AS name,
                c.created_at AS created_at,
                c.updated_at AS updated_at
             FROM collections c
             WHERE c.owner_id = ?1
                OR EXISTS(
                    SELECT 1
                    FROM collection_users cu
                    WHERE cu.collection_id = c.id
                      AND cu.user_id = ?1
                )
             ORDER BY c.name ASC, c.id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            collections.push(parse_collection_row(row)?);
        }
        Ok(collections)
    }

    fn rename_collection(&self, id: CollectionId, name: &str) -> RepoResult<Collection> {
        let changed = self.conn.execute(
            "UPDATE collections
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::ScopeNotFound(Scope::collection(id)));
        }
        load_required_collection(self.conn, id)
    }

    fn delete_collection(&self, id: CollectionId) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        let bullets: i64 = tx.query_row(
            "SELECT COUNT(*) FROM bullets WHERE collection_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        let changed = tx.execute("DELETE FROM collections WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ScopeNotFound(Scope::collection(id)));
        }
        tx.commit()?;

        info!("event=collection_delete module=repo status=ok collection={id} bullets={bullets}");
        Ok(())
    }

    fn list_members(&self, id: CollectionId) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                u.id AS id,
                u.name AS name,
                u.email AS email,
                u.created_at AS created_at
             FROM collection_users cu
             INNER JOIN users u ON u.id = cu.user_id
             WHERE cu.collection_id = ?1
             ORDER BY cu.created_at ASC, u.id ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_user_row(row)?);
        }
        Ok(members)
    }

    fn is_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<bool> {
        is_member(self.conn, id, user_id)
    }

    fn add_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        if load_collection(&tx, id)?.is_none() {
            return Err(RepoError::ScopeNotFound(Scope::collection(id)));
        }
        if is_member(&tx, id, user_id)? {
            return Err(RepoError::AlreadyMember {
                collection_id: id,
                user_id,
            });
        }
        tx.execute(
            "INSERT INTO collection_users (collection_id, user_id) VALUES (?1, ?2);",
            params![id.to_string(), user_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove_member(&self, id: CollectionId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM collection_users WHERE collection_id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound {
                collection_id: id,
                user_id,
            });
        }
        Ok(())
    }
}

fn is_member(conn: &Connection, id: CollectionId, user_id: UserId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM collection_users
            WHERE collection_id = ?1
              AND user_id = ?2
        );",
        params![id.to_string(), user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_collection(conn: &Connection, id: CollectionId) -> RepoResult<Option<Collection>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, created_at, updated_at
         FROM collections
         WHERE id = ?1;",
    )?;
    stmt.query_row([id.to_string()], |row| Ok(parse_collection_row(row)))
        .optional()?
        .transpose()
}

fn load_required_collection(conn: &Connection, id: CollectionId) -> RepoResult<Collection> {
    load_collection(conn, id)?.ok_or(RepoError::ScopeNotFound(Scope::collection(id)))
}

fn parse_collection_row(row: &Row<'_>) -> RepoResult<Collection> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    Ok(Collection {
        id: parse_uuid(&id_text, "collections.id")?,
        owner_id: parse_uuid(&owner_text, "collections.owner_id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
