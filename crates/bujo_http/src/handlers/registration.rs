use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bujo_core::{SqliteUserService, User};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

/// Creates a user. Reached only while registration is enabled.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .store
        .run(move |conn| {
            let service = SqliteUserService::from_connection(conn)?;
            Ok(service.register(&request.name, &request.email)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}
