//! Collection and sharing use-case service.
//!
//! # Invariants
//! - Only the owner may delete or share a collection.
//! - A member may remove themselves; any other removal needs `share`.
//! - The owner is never added as a member.

use super::{normalize_name, ServiceError, ServiceResult};
use crate::access::{Ability, AccessPolicy, ActingContext, StoreAccessPolicy};
use crate::model::collection::Collection;
use crate::model::scope::{CollectionId, Scope, UserId};
use crate::model::user::User;
use crate::repo::collection_repo::{CollectionRepository, SqliteCollectionRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;
use rusqlite::Connection;
use serde::Serialize;

/// Collection with its shared members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDetails {
    #[serde(flatten)]
    pub collection: Collection,
    pub members: Vec<User>,
}

/// Collection service facade.
pub struct CollectionService<C: CollectionRepository, U: UserRepository, P: AccessPolicy> {
    collections: C,
    users: U,
    policy: P,
}

/// Service wired to one SQLite connection.
pub type SqliteCollectionService<'conn> = CollectionService<
    SqliteCollectionRepository<'conn>,
    SqliteUserRepository<'conn>,
    StoreAccessPolicy<'conn>,
>;

impl<'conn> SqliteCollectionService<'conn> {
    pub fn from_connection(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self::new(
            SqliteCollectionRepository::try_new(conn)?,
            SqliteUserRepository::try_new(conn)?,
            StoreAccessPolicy::new(conn),
        ))
    }
}

impl<C: CollectionRepository, U: UserRepository, P: AccessPolicy> CollectionService<C, U, P> {
    pub fn new(collections: C, users: U, policy: P) -> Self {
        Self {
            collections,
            users,
            policy,
        }
    }

    /// Creates a collection owned by the acting user.
    pub fn create(&self, ctx: &ActingContext, name: &str) -> ServiceResult<Collection> {
        let name = normalize_name(name).ok_or_else(|| ServiceError::InvalidName(name.to_string()))?;
        Ok(self.collections.create_collection(ctx.user_id, &name)?)
    }

    pub fn get(&self, ctx: &ActingContext, id: CollectionId) -> ServiceResult<CollectionDetails> {
        self.policy
            .authorize(ctx, &Scope::collection(id), Ability::View)?;
        let collection = self
            .collections
            .get_collection(id)?
            .ok_or(ServiceError::CollectionNotFound(id))?;
        let members = self.collections.list_members(id)?;
        Ok(CollectionDetails {
            collection,
            members,
        })
    }

    /// Collections owned by or shared with the acting user.
    pub fn list(&self, ctx: &ActingContext) -> ServiceResult<Vec<Collection>> {
        Ok(self.collections.list_for_user(ctx.user_id)?)
    }

    pub fn rename(
        &self,
        ctx: &ActingContext,
        id: CollectionId,
        name: &str,
    ) -> ServiceResult<Collection> {
        self.policy
            .authorize(ctx, &Scope::collection(id), Ability::Update)?;
        let name = normalize_name(name).ok_or_else(|| ServiceError::InvalidName(name.to_string()))?;
        Ok(self.collections.rename_collection(id, &name)?)
    }

    /// Deletes the collection together with its bullets and memberships.
    pub fn delete(&self, ctx: &ActingContext, id: CollectionId) -> ServiceResult<()> {
        self.policy
            .authorize(ctx, &Scope::collection(id), Ability::Delete)?;
        Ok(self.collections.delete_collection(id)?)
    }

    /// Shares the collection with the user registered under `email`.
    pub fn share(&self, ctx: &ActingContext, id: CollectionId, email: &str) -> ServiceResult<User> {
        self.policy
            .authorize(ctx, &Scope::collection(id), Ability::Share)?;
        let collection = self
            .collections
            .get_collection(id)?
            .ok_or(ServiceError::CollectionNotFound(id))?;
        let user = self
            .users
            .find_by_email(email)?
            .ok_or_else(|| ServiceError::UserNotFound(email.trim().to_string()))?;
        if collection.is_owned_by(user.id) {
            return Err(ServiceError::CannotShareWithOwner(id));
        }

        self.collections.add_member(id, user.id)?;
        info!("event=collection_share module=service status=ok collection={id} member={}", user.id);
        Ok(user)
    }

    /// Removes `user_id` from the members of the collection.
    pub fn unshare(
        &self,
        ctx: &ActingContext,
        id: CollectionId,
        user_id: UserId,
    ) -> ServiceResult<()> {
        let leaving = user_id == ctx.user_id && self.collections.is_member(id, user_id)?;
        if !leaving {
            self.policy
                .authorize(ctx, &Scope::collection(id), Ability::Share)?;
        }

        self.collections.remove_member(id, user_id)?;
        info!("event=collection_unshare module=service status=ok collection={id} member={user_id}");
        Ok(())
    }
}
