//! Journal domain model.
//!
//! # Responsibility
//! - Define bullets, scopes, collections and users shared by repositories,
//!   services and outer surfaces.
//! - Keep validation of user-supplied text next to the types it guards.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - A bullet always belongs to exactly one `Scope`.

pub mod bullet;
pub mod collection;
pub mod scope;
pub mod user;
