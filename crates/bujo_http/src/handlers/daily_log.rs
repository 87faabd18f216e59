use super::{BulletList, NewBulletRequest, UpdateBulletRequest};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use bujo_core::{
    ActingContext, Bullet, BulletDraft, BulletId, BulletLocation, BulletPatch, MoveTarget, Scope,
    SqliteBulletService,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct NewDailyBulletRequest {
    #[serde(flatten)]
    pub bullet: NewBulletRequest,
    pub date: Option<NaiveDate>,
}

/// Body for moving a bullet into the acting user's daily log.
#[derive(Debug, Deserialize)]
pub struct MoveToDailyLogRequest {
    pub bullet_id: BulletId,
    pub date: Option<NaiveDate>,
    /// Zero-based target index; appends when absent.
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DailyLogView {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub list: BulletList,
}

fn log_scope(ctx: &ActingContext, date: Option<NaiveDate>) -> (Scope, NaiveDate) {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    (Scope::daily_log(ctx.user_id, date), date)
}

pub async fn index(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiQuery(query): ApiQuery<DailyLogQuery>,
) -> ApiResult<Json<DailyLogView>> {
    let (scope, date) = log_scope(&ctx, query.date);
    let bullets = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.list(&ctx, &scope)?)
        })
        .await?;
    Ok(Json(DailyLogView {
        date,
        list: BulletList { bullets },
    }))
}

pub async fn store(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiJson(request): ApiJson<NewDailyBulletRequest>,
) -> ApiResult<(StatusCode, Json<Bullet>)> {
    let (scope, _) = log_scope(&ctx, request.date);
    let draft = BulletDraft::new(request.bullet.kind, request.bullet.content);
    let bullet = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.create(&ctx, &scope, draft)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(bullet)))
}

/// Moves a bullet from anywhere the user may update into their daily log.
pub async fn move_here(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiJson(request): ApiJson<MoveToDailyLogRequest>,
) -> ApiResult<Json<DailyLogView>> {
    let (scope, date) = log_scope(&ctx, request.date);
    let target = MoveTarget::from(request.index);
    let bullets = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            service.move_bullet(&ctx, request.bullet_id, &scope, target)?;
            Ok(service.list(&ctx, &scope)?)
        })
        .await?;
    Ok(Json(DailyLogView {
        date,
        list: BulletList { bullets },
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(bullet_id): ApiPath<BulletId>,
    ApiJson(request): ApiJson<UpdateBulletRequest>,
) -> ApiResult<Json<Bullet>> {
    let patch = BulletPatch::from(request);
    let bullet = state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.update(&ctx, BulletLocation::DailyLog, bullet_id, &patch)?)
        })
        .await?;
    Ok(Json(bullet))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<ActingContext>,
    ApiPath(bullet_id): ApiPath<BulletId>,
) -> ApiResult<StatusCode> {
    state
        .store
        .run(move |conn| {
            let service = SqliteBulletService::from_connection(conn)?;
            Ok(service.delete(&ctx, BulletLocation::DailyLog, bullet_id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
