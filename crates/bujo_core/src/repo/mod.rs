//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQL details from service orchestration.
//! - Apply ordering plans inside one transaction per operation.
//!
//! # Invariants
//! - Repository reads return concrete, ordered sequences; nothing is
//!   fetched lazily behind a model.
//! - Repository APIs return semantic errors (`ScopeNotFound`,
//!   `BulletNotFound`, ...) in addition to DB transport errors.
//! - Multi-statement writes either commit fully or roll back.

pub mod bullet_repo;
pub mod collection_repo;
mod error;
mod sql;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
