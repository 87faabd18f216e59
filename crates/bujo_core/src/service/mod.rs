//! Journal use-case services.
//!
//! # Responsibility
//! - Run the capability check for the acting user before any repository
//!   call that reads or mutates a scope.
//! - Validate user input and map repository failures into `ServiceError`.
//!
//! # Invariants
//! - Every scoped operation takes an explicit `ActingContext`.
//! - A denied check happens before any mutation.

pub mod bullet_service;
pub mod collection_service;
mod error;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};

const MAX_NAME_CHARS: usize = 120;

/// Trims a display name and rejects blank or overlong values.
pub(crate) fn normalize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}
