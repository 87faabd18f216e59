use crate::filters::{
    IdentityLayer, RegistrationGateLayer, RequestLogLayer, LOGIN_PATH, REGISTER_PATH,
};
use crate::handlers::{
    collection_bullets, collections, daily_log, health, preferences, registration, sharing,
};
use crate::state::AppState;
use axum::routing::{delete, get, post, put};
use axum::Router;
use log::{info, warn};
use tokio::net::TcpListener;

/// Builds the full route table with filters applied.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route(LOGIN_PATH, get(health::login))
        .route(REGISTER_PATH, post(registration::register));

    let protected = Router::new()
        .route(
            "/user/preferences",
            get(preferences::show).patch(preferences::update),
        )
        .route(
            "/daily-log",
            get(daily_log::index)
                .post(daily_log::store)
                .put(daily_log::move_here),
        )
        .route(
            "/daily-log/:bullet",
            put(daily_log::update)
                .patch(daily_log::update)
                .delete(daily_log::destroy),
        )
        .route("/c", get(collections::index).post(collections::store))
        .route(
            "/c/:collection",
            get(collections::show)
                .put(collections::update)
                .patch(collections::update)
                .delete(collections::destroy),
        )
        .route(
            "/c/:collection/bullets",
            post(collection_bullets::store).put(collection_bullets::move_here),
        )
        .route(
            "/c/:collection/bullets/done",
            delete(collection_bullets::destroy_done),
        )
        .route(
            "/c/:collection/bullets/:bullet",
            put(collection_bullets::update)
                .patch(collection_bullets::update)
                .delete(collection_bullets::destroy),
        )
        .route("/c/:collection/order", put(collection_bullets::reorder))
        .route("/c/:collection/users", post(sharing::store))
        .route("/c/:collection/users/:user", delete(sharing::destroy))
        .route_layer(IdentityLayer::new(state.clone()));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(RegistrationGateLayer::new(state.registration_enabled))
        .layer(RequestLogLayer)
        .with_state(state)
}

/// Serves `router` on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=http status=error error={err}");
        return;
    }
    info!("event=shutdown_signal module=http status=ok");
}
