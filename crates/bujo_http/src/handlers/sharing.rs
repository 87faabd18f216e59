use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use bujo_core::{ActingContext, CollectionId, SqliteCollectionService, User, UserId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
}

/// Adds the user registered under `email` as a member.
pub async fn store(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
    ApiJson(request): ApiJson<ShareRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let member = state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.share(&ctx, collection_id, &request.email)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath((collection_id, user_id)): ApiPath<(CollectionId, UserId)>,
) -> ApiResult<StatusCode> {
    state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.unshare(&ctx, collection_id, user_id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
