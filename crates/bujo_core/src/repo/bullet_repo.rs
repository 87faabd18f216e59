//! Bullet repository: the transactional side of the ordering engine.
//!
//! # Responsibility
//! - Persist bullets and their per-scope position keys.
//! - Apply `ordering` plans (append, reorder, move, renormalize) and bulk
//!   removal inside one `IMMEDIATE` transaction each.
//!
//! # Invariants
//! - Scope listing is deterministic: `position ASC`.
//! - Positions of committed rows are positive and unique per scope. Rows
//!   being renumbered are parked at `-position` first, so the per-scope
//!   UNIQUE indexes never see a transient duplicate.
//! - Removing a bullet never renumbers the rest of its scope.

use super::sql::{begin_immediate, ensure_connection_ready, parse_uuid};
use super::{RepoError, RepoResult};
use crate::model::bullet::{
    normalize_content, Bullet, BulletDraft, BulletId, BulletKind, BulletPatch, BulletState,
};
use crate::model::scope::{date_to_db, parse_db_date, Scope, UserId};
use crate::ordering::{
    plan_insert, plan_reorder, renormalized_positions, InsertPlan, MoveTarget, PositionAssignment,
};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const BULLET_SELECT_SQL: &str = "SELECT
    id,
    collection_id,
    log_user_id,
    log_date,
    kind,
    content,
    state,
    position,
    created_by,
    created_at,
    updated_at
FROM bullets";

/// Repository interface for bullet storage and ordering.
pub trait BulletRepository {
    /// Creates one bullet after the current last member of `scope`.
    fn append_bullet(
        &self,
        scope: &Scope,
        draft: &BulletDraft,
        created_by: UserId,
    ) -> RepoResult<Bullet>;
    fn get_bullet(&self, id: BulletId) -> RepoResult<Option<Bullet>>;
    /// Lists a scope in stored order.
    fn list_scope(&self, scope: &Scope) -> RepoResult<Vec<Bullet>>;
    /// Applies every field of `patch` in one statement. Position and scope
    /// are untouched.
    fn update_bullet(&self, id: BulletId, patch: &BulletPatch) -> RepoResult<Bullet>;
    /// Pure state transition; position is untouched.
    fn set_state(&self, id: BulletId, state: BulletState) -> RepoResult<Bullet>;
    fn delete_bullet(&self, id: BulletId) -> RepoResult<()>;
    /// Rewrites listed bullets into their previous slots in the given order.
    fn reorder_scope(&self, scope: &Scope, ordered_ids: &[BulletId]) -> RepoResult<()>;
    /// Reassigns scope and position of one bullet.
    fn move_bullet(
        &self,
        id: BulletId,
        destination: &Scope,
        target: MoveTarget,
    ) -> RepoResult<Bullet>;
    /// Deletes every bullet of `scope` in `state`; returns the count removed.
    fn bulk_remove_by_state(&self, scope: &Scope, state: BulletState) -> RepoResult<usize>;
    /// Re-encodes the scope's keys to even spacing without changing order.
    fn renormalize_scope(&self, scope: &Scope) -> RepoResult<()>;
}

/// SQLite-backed bullet repository.
pub struct SqliteBulletRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBulletRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["bullets", "collections", "users"])?;
        Ok(Self { conn })
    }
}

impl BulletRepository for SqliteBulletRepository<'_> {
    fn append_bullet(
        &self,
        scope: &Scope,
        draft: &BulletDraft,
        created_by: UserId,
    ) -> RepoResult<Bullet> {
        let content = normalize_content(&draft.content)?;
        let id = Uuid::new_v4();

        let tx = begin_immediate(self.conn)?;
        ensure_scope_exists(&tx, scope)?;
        let members = list_scope_positions(&tx, scope)?;
        let keys: Vec<i64> = members.iter().map(|(_, position)| *position).collect();
        let position = match plan_insert(&keys, keys.len()) {
            InsertPlan::Fits(position) => position,
            InsertPlan::Renormalize {
                positions,
                position,
            } => {
                renormalize_members(&tx, scope, &members, &positions)?;
                position
            }
        };

        let (collection_id, log_user_id, log_date) = scope_columns(scope);
        tx.execute(
            "INSERT INTO bullets (
                id,
                collection_id,
                log_user_id,
                log_date,
                kind,
                content,
                state,
                position,
                created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'open', ?7, ?8);",
            params![
                id.to_string(),
                collection_id,
                log_user_id,
                log_date,
                draft.kind.as_str(),
                content,
                position,
                created_by.to_string(),
            ],
        )?;
        tx.commit()?;

        debug!("event=bullet_append module=ordering status=ok scope={scope} position={position}");
        load_required_bullet(self.conn, id)
    }

    fn get_bullet(&self, id: BulletId) -> RepoResult<Option<Bullet>> {
        load_bullet(self.conn, id)
    }

    fn list_scope(&self, scope: &Scope) -> RepoResult<Vec<Bullet>> {
        let filter = ScopeFilter::new(scope);
        let mut stmt = self.conn.prepare(&format!(
            "{BULLET_SELECT_SQL}
             WHERE {}
             ORDER BY position ASC;",
            filter.clause
        ))?;
        let mut rows = stmt.query(params_from_iter(filter.values))?;
        let mut bullets = Vec::new();
        while let Some(row) = rows.next()? {
            bullets.push(parse_bullet_row(row)?);
        }
        Ok(bullets)
    }

    fn update_bullet(&self, id: BulletId, patch: &BulletPatch) -> RepoResult<Bullet> {
        let content = patch
            .content
            .as_deref()
            .map(normalize_content)
            .transpose()?;
        let changed = self.conn.execute(
            "UPDATE bullets
             SET content = COALESCE(?2, content),
                 kind = COALESCE(?3, kind),
                 state = COALESCE(?4, state),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                content,
                patch.kind.map(BulletKind::as_str),
                patch.state.map(BulletState::as_str),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::BulletNotFound(id));
        }
        load_required_bullet(self.conn, id)
    }

    fn set_state(&self, id: BulletId, state: BulletState) -> RepoResult<Bullet> {
        let changed = self.conn.execute(
            "UPDATE bullets
             SET state = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), state.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::BulletNotFound(id));
        }
        load_required_bullet(self.conn, id)
    }

    fn delete_bullet(&self, id: BulletId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bullets WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::BulletNotFound(id));
        }
        Ok(())
    }

    fn reorder_scope(&self, scope: &Scope, ordered_ids: &[BulletId]) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        ensure_scope_exists(&tx, scope)?;
        let current = list_scope_positions(&tx, scope)?;
        let assignments = plan_reorder(&current, ordered_ids)?;
        apply_assignments(&tx, &assignments)?;
        tx.commit()?;

        debug!(
            "event=scope_reorder module=ordering status=ok scope={scope} listed={} rewritten={}",
            ordered_ids.len(),
            assignments.len()
        );
        Ok(())
    }

    fn move_bullet(
        &self,
        id: BulletId,
        destination: &Scope,
        target: MoveTarget,
    ) -> RepoResult<Bullet> {
        let tx = begin_immediate(self.conn)?;
        let bullet = load_bullet(&tx, id)?.ok_or(RepoError::BulletNotFound(id))?;
        ensure_scope_exists(&tx, destination)?;

        let others: Vec<(BulletId, i64)> = list_scope_positions(&tx, destination)?
            .into_iter()
            .filter(|(member_id, _)| *member_id != id)
            .collect();
        let keys: Vec<i64> = others.iter().map(|(_, position)| *position).collect();
        let index = target.resolve(keys.len());

        park(&tx, id)?;
        let position = match plan_insert(&keys, index) {
            InsertPlan::Fits(position) => position,
            InsertPlan::Renormalize {
                positions,
                position,
            } => {
                renormalize_members(&tx, destination, &others, &positions)?;
                position
            }
        };

        let (collection_id, log_user_id, log_date) = scope_columns(destination);
        tx.execute(
            "UPDATE bullets
             SET collection_id = ?2,
                 log_user_id = ?3,
                 log_date = ?4,
                 position = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                collection_id,
                log_user_id,
                log_date,
                position
            ],
        )?;
        tx.commit()?;

        debug!(
            "event=bullet_move module=ordering status=ok from={} to={destination} index={index} position={position}",
            bullet.scope
        );
        load_required_bullet(self.conn, id)
    }

    fn bulk_remove_by_state(&self, scope: &Scope, state: BulletState) -> RepoResult<usize> {
        let tx = begin_immediate(self.conn)?;
        ensure_scope_exists(&tx, scope)?;
        let filter = ScopeFilter::new(scope);
        let mut values = filter.values;
        values.push(Value::Text(state.as_str().to_string()));
        let removed = tx.execute(
            &format!("DELETE FROM bullets WHERE {} AND state = ?;", filter.clause),
            params_from_iter(values),
        )?;
        tx.commit()?;

        info!(
            "event=bulk_remove module=ordering status=ok scope={scope} state={} removed={removed}",
            state.as_str()
        );
        Ok(removed)
    }

    fn renormalize_scope(&self, scope: &Scope) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        ensure_scope_exists(&tx, scope)?;
        let members = list_scope_positions(&tx, scope)?;
        let positions = renormalized_positions(members.len());
        renormalize_members(&tx, scope, &members, &positions)?;
        tx.commit()?;
        Ok(())
    }
}

/// Scope predicate over the `bullets` table with anonymous placeholders.
struct ScopeFilter {
    clause: &'static str,
    values: Vec<Value>,
}

impl ScopeFilter {
    fn new(scope: &Scope) -> Self {
        match scope {
            Scope::Collection { collection_id } => Self {
                clause: "collection_id = ?",
                values: vec![Value::Text(collection_id.to_string())],
            },
            Scope::DailyLog { user_id, date } => Self {
                clause: "collection_id IS NULL AND log_user_id = ? AND log_date = ?",
                values: vec![
                    Value::Text(user_id.to_string()),
                    Value::Text(date_to_db(*date)),
                ],
            },
        }
    }
}

fn scope_columns(scope: &Scope) -> (Option<String>, Option<String>, Option<String>) {
    match scope {
        Scope::Collection { collection_id } => (Some(collection_id.to_string()), None, None),
        Scope::DailyLog { user_id, date } => {
            (None, Some(user_id.to_string()), Some(date_to_db(*date)))
        }
    }
}

fn scope_exists(conn: &Connection, scope: &Scope) -> RepoResult<bool> {
    let exists: i64 = match scope {
        Scope::Collection { collection_id } => conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM collections WHERE id = ?1);",
            [collection_id.to_string()],
            |row| row.get(0),
        )?,
        // A daily log exists for every date once its user exists.
        Scope::DailyLog { user_id, .. } => conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?,
    };
    Ok(exists == 1)
}

fn ensure_scope_exists(conn: &Connection, scope: &Scope) -> RepoResult<()> {
    if scope_exists(conn, scope)? {
        Ok(())
    } else {
        Err(RepoError::ScopeNotFound(*scope))
    }
}

fn list_scope_positions(conn: &Connection, scope: &Scope) -> RepoResult<Vec<(BulletId, i64)>> {
    let filter = ScopeFilter::new(scope);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, position
         FROM bullets
         WHERE {}
           AND position > 0
         ORDER BY position ASC;",
        filter.clause
    ))?;
    let mut rows = stmt.query(params_from_iter(filter.values))?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        members.push((parse_uuid(&id_text, "bullets.id")?, row.get(1)?));
    }
    Ok(members)
}

fn park(conn: &Connection, id: BulletId) -> RepoResult<()> {
    conn.execute(
        "UPDATE bullets SET position = -position WHERE id = ?1 AND position > 0;",
        [id.to_string()],
    )?;
    Ok(())
}

/// Writes new keys for the listed bullets, parking all of them first.
fn apply_assignments(conn: &Connection, assignments: &[PositionAssignment]) -> RepoResult<()> {
    for assignment in assignments {
        park(conn, assignment.bullet_id)?;
    }
    for assignment in assignments {
        conn.execute(
            "UPDATE bullets
             SET position = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![assignment.bullet_id.to_string(), assignment.position],
        )?;
    }
    Ok(())
}

fn renormalize_members(
    conn: &Connection,
    scope: &Scope,
    members: &[(BulletId, i64)],
    positions: &[i64],
) -> RepoResult<()> {
    let assignments: Vec<PositionAssignment> = members
        .iter()
        .zip(positions)
        .map(|((bullet_id, _), position)| PositionAssignment {
            bullet_id: *bullet_id,
            position: *position,
        })
        .collect();
    apply_assignments(conn, &assignments)?;
    info!(
        "event=scope_renormalize module=ordering status=ok scope={scope} members={}",
        assignments.len()
    );
    Ok(())
}

fn load_bullet(conn: &Connection, id: BulletId) -> RepoResult<Option<Bullet>> {
    let mut stmt = conn.prepare(&format!("{BULLET_SELECT_SQL} WHERE id = ?1;"))?;
    stmt.query_row([id.to_string()], |row| Ok(parse_bullet_row(row)))
        .optional()?
        .transpose()
}

fn load_required_bullet(conn: &Connection, id: BulletId) -> RepoResult<Bullet> {
    load_bullet(conn, id)?.ok_or(RepoError::BulletNotFound(id))
}

fn parse_bullet_row(row: &Row<'_>) -> RepoResult<Bullet> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "bullets.id")?;

    let collection_id = row
        .get::<_, Option<String>>("collection_id")?
        .map(|value| parse_uuid(&value, "bullets.collection_id"))
        .transpose()?;
    let log_user_id = row
        .get::<_, Option<String>>("log_user_id")?
        .map(|value| parse_uuid(&value, "bullets.log_user_id"))
        .transpose()?;
    let log_date = match row.get::<_, Option<String>>("log_date")? {
        Some(value) => Some(parse_db_date(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid date `{value}` in bullets.log_date"))
        })?),
        None => None,
    };
    let scope = match (collection_id, log_user_id, log_date) {
        (Some(collection_id), None, None) => Scope::collection(collection_id),
        (None, Some(user_id), Some(date)) => Scope::daily_log(user_id, date),
        _ => {
            return Err(RepoError::InvalidData(format!(
                "bullet {id} has no single owning scope"
            )));
        }
    };

    let kind_text: String = row.get("kind")?;
    let kind = BulletKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid bullet kind `{kind_text}` in bullets.kind"))
    })?;
    let state_text: String = row.get("state")?;
    let state = BulletState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid bullet state `{state_text}` in bullets.state"
        ))
    })?;
    let created_by_text: String = row.get("created_by")?;

    Ok(Bullet {
        id,
        scope,
        kind,
        content: row.get("content")?,
        state,
        position: row.get("position")?,
        created_by: parse_uuid(&created_by_text, "bullets.created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
