use super::BulletList;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use bujo_core::{
    ActingContext, Collection, CollectionDetails, CollectionId, SqliteBulletService,
    SqliteCollectionService,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CollectionNameRequest {
    pub name: String,
}

/// Collection with members and its ordered bullets.
#[derive(Debug, Serialize)]
pub struct CollectionView {
    #[serde(flatten)]
    pub details: CollectionDetails,
    #[serde(flatten)]
    pub list: BulletList,
}

pub async fn index(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
) -> ApiResult<Json<Vec<Collection>>> {
    let collections = state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.list(&ctx)?)
        })
        .await?;
    Ok(Json(collections))
}

pub async fn store(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiJson(request): ApiJson<CollectionNameRequest>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.create(&ctx, &request.name)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
) -> ApiResult<Json<CollectionView>> {
    let view = state
        .store
        .run(move |conn| load_view(conn, &ctx, collection_id))
        .await?;
    Ok(Json(view))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
    ApiJson(request): ApiJson<CollectionNameRequest>,
) -> ApiResult<Json<Collection>> {
    let collection = state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.rename(&ctx, collection_id, &request.name)?)
        })
        .await?;
    Ok(Json(collection))
}

/// Deletes the collection with all of its bullets and memberships.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
) -> ApiResult<StatusCode> {
    state
        .store
        .run(move |conn| {
            let service = SqliteCollectionService::from_connection(conn)?;
            Ok(service.delete(&ctx, collection_id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn load_view(
    conn: &rusqlite::Connection,
    ctx: &ActingContext,
    collection_id: CollectionId,
) -> ApiResult<CollectionView> {
    let details = SqliteCollectionService::from_connection(conn)?.get(ctx, collection_id)?;
    let bullets =
        SqliteBulletService::from_connection(conn)?.list(ctx, &details.collection.scope())?;
    Ok(CollectionView {
        details,
        list: BulletList { bullets },
    })
}
