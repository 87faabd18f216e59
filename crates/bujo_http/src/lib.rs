//! HTTP surface for the bullet journal.
//!
//! # Responsibility
//! - Expose journal use-cases as JSON routes.
//! - Run request filters in a fixed order: request log, registration gate,
//!   identity resolution.
//! - Map service errors to HTTP status codes.
//!
//! # Invariants
//! - Store work never runs on the async executor threads.
//! - Handlers receive the acting user explicitly as `ActingContext`.

pub mod error;
pub mod extract;
pub mod filters;
mod handlers;
pub mod identity;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use identity::{HeaderIdentity, IdentityProvider, USER_ID_HEADER};
pub use router::{build_router, serve};
pub use state::{AppState, Store};
