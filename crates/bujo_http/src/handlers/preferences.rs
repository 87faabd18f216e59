use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use bujo_core::{ActingContext, SqliteUserService, UserPreferences};
use serde_json::Value;

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
) -> ApiResult<Json<UserPreferences>> {
    let preferences = state
        .store
        .run(move |conn| {
            let service = SqliteUserService::from_connection(conn)?;
            Ok(service.preferences(&ctx)?)
        })
        .await?;
    Ok(Json(preferences))
}

/// Merges the body object into stored preferences; `null` removes a key.
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Json<UserPreferences>> {
    let Value::Object(patch) = patch else {
        return Err(ApiError::BadRequest(
            "preferences patch must be a JSON object".to_string(),
        ));
    };
    let preferences = state
        .store
        .run(move |conn| {
            let service = SqliteUserService::from_connection(conn)?;
            Ok(service.update_preferences(&ctx, &patch)?)
        })
        .await?;
    Ok(Json(preferences))
}
