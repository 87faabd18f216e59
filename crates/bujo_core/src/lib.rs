//! Core domain logic for the bullet journal.
//! This crate is the single source of truth for ordering and access invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use access::{Ability, AccessError, AccessPolicy, ActingContext, StoreAccessPolicy};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{
    init_logging, init_stderr_logging, logging_status, LogLevel, LogTarget, LoggingError,
};
pub use model::bullet::{Bullet, BulletDraft, BulletId, BulletKind, BulletPatch, BulletState};
pub use model::collection::Collection;
pub use model::scope::{CollectionId, Scope, UserId};
pub use model::user::{User, UserPreferences};
pub use ordering::{InvalidOrderReason, MoveTarget, POSITION_GAP};
pub use repo::{RepoError, RepoResult};
pub use service::bullet_service::{BulletLocation, BulletService, SqliteBulletService};
pub use service::collection_service::{
    CollectionDetails, CollectionService, SqliteCollectionService,
};
pub use service::user_service::{SqliteUserService, UserService};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
