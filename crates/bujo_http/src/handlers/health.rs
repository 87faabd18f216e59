use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": bujo_core::core_version() }))
}

/// Target of the closed-registration redirect. Sign-in itself is handled
/// by the identity front end.
pub async fn login() -> Json<Value> {
    Json(json!({ "message": "sign in through the identity provider" }))
}
