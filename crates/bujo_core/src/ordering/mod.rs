//! Position key planning for bullet order.
//!
//! # Responsibility
//! - Decide which position keys a scope needs after an insert, move or
//!   reorder, without touching storage.
//! - Keep the key arithmetic separate from the transactional code in
//!   `repo::bullet_repo` that applies the plans.
//!
//! # Invariants
//! - Input key slices are strictly ascending and positive.
//! - Every plan keeps keys strictly ascending and unique per scope.
//! - Renormalization re-encodes keys; it never changes relative order.

mod position;
mod reorder;

pub use position::{plan_insert, renormalized_positions, InsertPlan, MoveTarget, POSITION_GAP};
pub use reorder::{plan_reorder, InvalidOrderReason, PositionAssignment};
