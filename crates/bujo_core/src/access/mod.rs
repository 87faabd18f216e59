//! Capability checks for journal scopes.
//!
//! # Responsibility
//! - Decide whether an acting user may perform an ability on a scope.
//! - Run before any ordering engine call, with the acting user passed in
//!   explicitly instead of read from ambient request state.
//!
//! # Invariants
//! - Checks are deny-by-default: a user with no relationship to a scope
//!   gets no ability on it.
//! - A missing scope is reported as missing, not as denied.

mod ability;
mod policy;

pub use ability::{parse_ability, Ability, AbilityError};
pub use policy::{AccessError, AccessPolicy, ActingContext, StoreAccessPolicy};
