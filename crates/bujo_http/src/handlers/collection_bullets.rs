use super::{BulletList, NewBulletRequest, ReorderRequest, UpdateBulletRequest};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::{Extension, Json};
use bujo_core::{
    ActingContext, Bullet, BulletDraft, BulletId, BulletLocation, BulletPatch, CollectionId,
    MoveTarget, Scope, SqliteBulletService,
};
use log::info;
use serde::Deserialize;

/// Body for moving a bullet into a collection.
#[derive(Debug, Deserialize)]
pub struct MoveToCollectionRequest {
    pub bullet_id: BulletId,
    /// Zero-based target index; appends when absent.
    pub index: Option<usize>,
}

pub async fn store(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
    ApiJson(request): ApiJson<NewBulletRequest>,
) -> ApiResult<(StatusCode, Json<Bullet>)> {
    let scope = Scope::collection(collection_id);
    let draft = BulletDraft::new(request.kind, request.content);
    let bullet = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.create(&ctx, &scope, draft)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(bullet)))
}

pub async fn move_here(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
    ApiJson(request): ApiJson<MoveToCollectionRequest>,
) -> ApiResult<Json<BulletList>> {
    let scope = Scope::collection(collection_id);
    let target = MoveTarget::from(request.index);
    let bullets = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            service.move_bullet(&ctx, request.bullet_id, &scope, target)?;
            Ok(service.list(&ctx, &scope)?)
        })
        .await?;
    Ok(Json(BulletList { bullets }))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath((collection_id, bullet_id)): ApiPath<(CollectionId, BulletId)>,
    ApiJson(request): ApiJson<UpdateBulletRequest>,
) -> ApiResult<Json<Bullet>> {
    let patch = BulletPatch::from(request);
    let bullet = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            let location = BulletLocation::Collection(collection_id);
            Ok(service.update(&ctx, location, bullet_id, &patch)?)
        })
        .await?;
    Ok(Json(bullet))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath((collection_id, bullet_id)): ApiPath<(CollectionId, BulletId)>,
) -> ApiResult<StatusCode> {
    state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            let location = BulletLocation::Collection(collection_id);
            Ok(service.delete(&ctx, location, bullet_id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removes completed bullets, then sends the client back to the collection.
pub async fn destroy_done(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
) -> ApiResult<Redirect> {
    let scope = Scope::collection(collection_id);
    let removed = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.clear_completed(&ctx, &scope)?)
        })
        .await?;
    info!(
        "event=clear_completed module=http status=ok collection={collection_id} removed={removed}"
    );
    Ok(Redirect::to(&format!("/c/{collection_id}")))
}

pub async fn reorder(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(collection_id): ApiPath<CollectionId>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> ApiResult<Json<BulletList>> {
    let scope = Scope::collection(collection_id);
    let bullets = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.reorder(&ctx, &scope, &request.bullet_ids)?)
        })
        .await?;
    Ok(Json(BulletList { bullets }))
}
