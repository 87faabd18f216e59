//! Bullet use-case service.
//!
//! # Responsibility
//! - Guard every ordering engine call with a capability check.
//! - Resolve bullets against the location a caller addressed them by.
//!
//! # Invariants
//! - Reads need `view`; every write needs `update` on each scope it touches.
//! - A bullet addressed through the wrong collection or another user's daily
//!   log reads as missing.

use super::{ServiceError, ServiceResult};
use crate::access::{Ability, AccessPolicy, ActingContext, StoreAccessPolicy};
use crate::model::bullet::{Bullet, BulletDraft, BulletId, BulletPatch, BulletState};
use crate::model::scope::{CollectionId, Scope};
use crate::ordering::MoveTarget;
use crate::repo::bullet_repo::{BulletRepository, SqliteBulletRepository};
use rusqlite::Connection;

/// Where a caller expects an addressed bullet to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletLocation {
    /// No constraint beyond access.
    Anywhere,
    Collection(CollectionId),
    /// Any date of the acting user's daily log.
    DailyLog,
}

impl BulletLocation {
    fn contains(self, ctx: &ActingContext, scope: &Scope) -> bool {
        match (self, scope) {
            (Self::Anywhere, _) => true,
            (Self::Collection(expected), Scope::Collection { collection_id }) => {
                expected == *collection_id
            }
            (Self::DailyLog, Scope::DailyLog { user_id, .. }) => *user_id == ctx.user_id,
            _ => false,
        }
    }
}

/// Bullet service facade over repository and access policy.
pub struct BulletService<R: BulletRepository, P: AccessPolicy> {
    repo: R,
    policy: P,
}

/// Service wired to one SQLite connection.
pub type SqliteBulletService<'conn> =
    BulletService<SqliteBulletRepository<'conn>, StoreAccessPolicy<'conn>>;

impl<'conn> SqliteBulletService<'conn> {
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(
            SqliteBulletRepository::try_new(conn)?,
            StoreAccessPolicy::new(conn),
        ))
    }
}

impl<R: BulletRepository, P: AccessPolicy> BulletService<R, P> {
    pub fn new(repo: R, policy: P) -> Self {
        Self { repo, policy }
    }

    /// Lists one scope in order.
    pub fn list(&self, ctx: &ActingContext, scope: &Scope) -> ServiceResult<Vec<Bullet>> {
        self.policy.authorize(ctx, scope, Ability::View)?;
        Ok(self.repo.list_scope(scope)?)
    }

    /// Loads one bullet visible to the acting user.
    pub fn get(
        &self,
        ctx: &ActingContext,
        location: BulletLocation,
        id: BulletId,
    ) -> ServiceResult<Bullet> {
        self.locate(ctx, location, id, Ability::View)
    }

    /// Appends a new bullet at the end of `scope`.
    pub fn create(
        &self,
        ctx: &ActingContext,
        scope: &Scope,
        draft: BulletDraft,
    ) -> ServiceResult<Bullet> {
        self.policy.authorize(ctx, scope, Ability::Update)?;
        let draft = draft.normalized()?;
        Ok(self.repo.append_bullet(scope, &draft, ctx.user_id)?)
    }

    /// Edits content, kind and state of one bullet as a single write.
    /// Position is untouched.
    pub fn update(
        &self,
        ctx: &ActingContext,
        location: BulletLocation,
        id: BulletId,
        patch: &BulletPatch,
    ) -> ServiceResult<Bullet> {
        if patch.is_empty() {
            return Err(ServiceError::EmptyUpdate);
        }
        self.locate(ctx, location, id, Ability::Update)?;
        Ok(self.repo.update_bullet(id, patch)?)
    }

    /// Pure state transition.
    pub fn set_state(
        &self,
        ctx: &ActingContext,
        location: BulletLocation,
        id: BulletId,
        state: BulletState,
    ) -> ServiceResult<Bullet> {
        self.locate(ctx, location, id, Ability::Update)?;
        Ok(self.repo.set_state(id, state)?)
    }

    pub fn delete(
        &self,
        ctx: &ActingContext,
        location: BulletLocation,
        id: BulletId,
    ) -> ServiceResult<()> {
        self.locate(ctx, location, id, Ability::Update)?;
        Ok(self.repo.delete_bullet(id)?)
    }

    /// Moves a bullet into `destination`, possibly its current scope.
    ///
    /// Requires `update` on both the source and the destination scope.
    pub fn move_bullet(
        &self,
        ctx: &ActingContext,
        id: BulletId,
        destination: &Scope,
        target: MoveTarget,
    ) -> ServiceResult<Bullet> {
        let bullet = self.locate(ctx, BulletLocation::Anywhere, id, Ability::Update)?;
        if bullet.scope != *destination {
            self.policy.authorize(ctx, destination, Ability::Update)?;
        }
        Ok(self.repo.move_bullet(id, destination, target)?)
    }

    /// Reorders the listed bullets and returns the scope in its new order.
    pub fn reorder(
        &self,
        ctx: &ActingContext,
        scope: &Scope,
        ordered_ids: &[BulletId],
    ) -> ServiceResult<Vec<Bullet>> {
        self.policy.authorize(ctx, scope, Ability::Update)?;
        self.repo.reorder_scope(scope, ordered_ids)?;
        Ok(self.repo.list_scope(scope)?)
    }

    /// Deletes all bullets of `scope` in `state`; returns how many.
    pub fn bulk_remove_by_state(
        &self,
        ctx: &ActingContext,
        scope: &Scope,
        state: BulletState,
    ) -> ServiceResult<usize> {
        self.policy.authorize(ctx, scope, Ability::Update)?;
        Ok(self.repo.bulk_remove_by_state(scope, state)?)
    }

    /// Deletes the completed bullets of `scope`.
    pub fn clear_completed(&self, ctx: &ActingContext, scope: &Scope) -> ServiceResult<usize> {
        self.bulk_remove_by_state(ctx, scope, BulletState::Complete)
    }

    /// Re-encodes the keys of `scope` to even spacing.
    pub fn renormalize(&self, ctx: &ActingContext, scope: &Scope) -> ServiceResult<Vec<Bullet>> {
        self.policy.authorize(ctx, scope, Ability::Update)?;
        self.repo.renormalize_scope(scope)?;
        Ok(self.repo.list_scope(scope)?)
    }

    fn locate(
        &self,
        ctx: &ActingContext,
        location: BulletLocation,
        id: BulletId,
        ability: Ability,
    ) -> ServiceResult<Bullet> {
        let bullet = self
            .repo
            .get_bullet(id)?
            .ok_or(ServiceError::BulletNotFound(id))?;
        if !location.contains(ctx, &bullet.scope) {
            return Err(ServiceError::BulletNotFound(id));
        }
        self.policy.authorize(ctx, &bullet.scope, ability)?;
        Ok(bullet)
    }
}
