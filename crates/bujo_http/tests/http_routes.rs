use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bujo_core::{open_db_in_memory, SqliteUserService, User};
use bujo_http::{build_router, AppState, HeaderIdentity, USER_ID_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    ada: User,
    bob: User,
}

fn app(registration_enabled: bool) -> TestApp {
    let conn = open_db_in_memory().unwrap();
    let (ada, bob) = {
        let users = SqliteUserService::from_connection(&conn).unwrap();
        (
            users.register("Ada", "ada@example.com").unwrap(),
            users.register("Bob", "bob@example.com").unwrap(),
        )
    };
    let state = AppState::new(conn, Arc::new(HeaderIdentity), registration_enabled);
    TestApp {
        router: build_router(state),
        ada,
        bob,
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

fn contents(list: &Value) -> Vec<String> {
    list["bullets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|bullet| bullet["content"].as_str().unwrap().to_string())
        .collect()
}

async fn create_collection(app: &TestApp, name: &str) -> String {
    let (status, _, body) = send(
        &app.router,
        Method::POST,
        "/c",
        Some(&app.ada),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app(false);
    let (status, _, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn closed_registration_redirects_to_login() {
    let app = app(false);
    let (status, headers, _) = send(
        &app.router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Cy", "email": "cy@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");
}

#[tokio::test]
async fn open_registration_creates_users() {
    let app = app(true);
    let (status, _, body) = send(
        &app.router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Cy", "email": "Cy@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "cy@example.com");

    let (status, _, body) = send(
        &app.router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Again", "email": "cy@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_taken");
}

#[tokio::test]
async fn protected_routes_need_a_known_user() {
    let app = app(false);
    let (status, _, body) = send(&app.router, Method::GET, "/daily-log", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let stranger = User {
        id: uuid::Uuid::new_v4(),
        ..app.ada.clone()
    };
    let (status, _, _) = send(&app.router, Method::GET, "/c", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn daily_log_create_list_update_delete() {
    let app = app(false);
    let uri = "/daily-log?date=2024-06-03";
    for content in ["call mom", "pay rent"] {
        let (status, _, body) = send(
            &app.router,
            Method::POST,
            "/daily-log",
            Some(&app.ada),
            Some(json!({ "content": content, "date": "2024-06-03" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["kind"], "task");
    }

    let (status, _, log) = send(&app.router, Method::GET, uri, Some(&app.ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["date"], "2024-06-03");
    assert_eq!(contents(&log), vec!["call mom", "pay rent"]);

    let first_id = log["bullets"][0]["id"].as_str().unwrap().to_string();
    let (status, _, updated) = send(
        &app.router,
        Method::PATCH,
        &format!("/daily-log/{first_id}"),
        Some(&app.ada),
        Some(json!({ "state": "complete" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["state"], "complete");
    assert_eq!(updated["position"], log["bullets"][0]["position"]);

    let (status, _, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/daily-log/{first_id}"),
        Some(&app.bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/daily-log/{first_id}"),
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, log) = send(&app.router, Method::GET, uri, Some(&app.ada), None).await;
    assert_eq!(contents(&log), vec!["pay rent"]);
}

#[tokio::test]
async fn blank_content_is_unprocessable() {
    let app = app(false);
    let (status, _, body) = send(
        &app.router,
        Method::POST,
        "/daily-log",
        Some(&app.ada),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_content");
}

#[tokio::test]
async fn malformed_requests_get_json_error_bodies() {
    let app = app(false);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/daily-log")
        .header(USER_ID_HEADER, app.ada.id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_request");

    let (status, _, body) = send(
        &app.router,
        Method::POST,
        "/daily-log",
        Some(&app.ada),
        Some(json!({ "kind": "task" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");

    let (status, _, body) = send(
        &app.router,
        Method::GET,
        "/c/not-a-uuid",
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, _, body) = send(
        &app.router,
        Method::GET,
        "/daily-log?date=yesterday",
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn move_from_daily_log_into_collection_end() {
    let app = app(false);
    let collection_id = create_collection(&app, "Projects").await;
    let (_, _, x) = send(
        &app.router,
        Method::POST,
        "/daily-log",
        Some(&app.ada),
        Some(json!({ "content": "X", "date": "2024-06-03" })),
    )
    .await;
    send(
        &app.router,
        Method::POST,
        "/daily-log",
        Some(&app.ada),
        Some(json!({ "content": "Y", "date": "2024-06-03" })),
    )
    .await;
    send(
        &app.router,
        Method::POST,
        &format!("/c/{collection_id}/bullets"),
        Some(&app.ada),
        Some(json!({ "content": "existing" })),
    )
    .await;

    let (status, _, list) = send(
        &app.router,
        Method::PUT,
        &format!("/c/{collection_id}/bullets"),
        Some(&app.ada),
        Some(json!({ "bullet_id": x["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contents(&list), vec!["existing", "X"]);

    let (_, _, log) = send(
        &app.router,
        Method::GET,
        "/daily-log?date=2024-06-03",
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(contents(&log), vec!["Y"]);

    let (status, _, log) = send(
        &app.router,
        Method::PUT,
        "/daily-log",
        Some(&app.ada),
        Some(json!({ "bullet_id": x["id"], "date": "2024-06-03", "index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contents(&log), vec!["X", "Y"]);
}

#[tokio::test]
async fn collection_show_reorder_and_clear_completed() {
    let app = app(false);
    let collection_id = create_collection(&app, "Chores").await;
    let mut ids = Vec::new();
    for content in ["A", "B", "D"] {
        let (_, _, bullet) = send(
            &app.router,
            Method::POST,
            &format!("/c/{collection_id}/bullets"),
            Some(&app.ada),
            Some(json!({ "content": content })),
        )
        .await;
        ids.push(bullet["id"].clone());
    }

    let (status, _, list) = send(
        &app.router,
        Method::PUT,
        &format!("/c/{collection_id}/order"),
        Some(&app.ada),
        Some(json!({ "bullet_ids": [ids[2], ids[0], ids[1]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contents(&list), vec!["D", "A", "B"]);

    let (status, _, body) = send(
        &app.router,
        Method::PUT,
        &format!("/c/{collection_id}/order"),
        Some(&app.ada),
        Some(json!({ "bullet_ids": [ids[0], ids[0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_order");

    let (status, _, list) = send(
        &app.router,
        Method::PUT,
        &format!("/c/{collection_id}/order"),
        Some(&app.ada),
        Some(json!({ "bullet_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contents(&list), vec!["D", "A", "B"]);

    send(
        &app.router,
        Method::PATCH,
        &format!("/c/{collection_id}/bullets/{}", ids[1].as_str().unwrap()),
        Some(&app.ada),
        Some(json!({ "state": "complete" })),
    )
    .await;
    let (status, headers, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/c/{collection_id}/bullets/done"),
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers[header::LOCATION].to_str().unwrap(),
        format!("/c/{collection_id}")
    );

    let (status, _, view) = send(
        &app.router,
        Method::GET,
        &format!("/c/{collection_id}"),
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["name"], "Chores");
    assert_eq!(view["members"], json!([]));
    assert_eq!(contents(&view), vec!["D", "A"]);
}

#[tokio::test]
async fn sharing_controls_collection_access() {
    let app = app(false);
    let collection_id = create_collection(&app, "Groceries").await;
    let collection_uri = format!("/c/{collection_id}");

    let (status, _, body) = send(
        &app.router,
        Method::GET,
        &collection_uri,
        Some(&app.bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");

    let (status, _, member) = send(
        &app.router,
        Method::POST,
        &format!("{collection_uri}/users"),
        Some(&app.ada),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["id"], app.bob.id.to_string());

    let (status, _, _) = send(
        &app.router,
        Method::POST,
        &format!("{collection_uri}/users"),
        Some(&app.ada),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app.router,
        Method::POST,
        &format!("{collection_uri}/bullets"),
        Some(&app.bob),
        Some(json!({ "content": "milk" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = send(
        &app.router,
        Method::DELETE,
        &collection_uri,
        Some(&app.bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app.router,
        Method::DELETE,
        &format!("{collection_uri}/users/{}", app.bob.id),
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(
        &app.router,
        Method::GET,
        &collection_uri,
        Some(&app.bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app.router,
        Method::DELETE,
        &collection_uri,
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, body) = send(
        &app.router,
        Method::GET,
        &collection_uri,
        Some(&app.ada),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "collection_not_found");
}

#[tokio::test]
async fn rename_and_list_collections() {
    let app = app(false);
    let collection_id = create_collection(&app, "Draft").await;

    let (status, _, renamed) = send(
        &app.router,
        Method::PUT,
        &format!("/c/{collection_id}"),
        Some(&app.ada),
        Some(json!({ "name": "Final" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Final");

    let (status, _, list) = send(&app.router, Method::GET, "/c", Some(&app.ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Final");
}

#[tokio::test]
async fn preferences_merge_through_patch() {
    let app = app(false);
    let (status, _, prefs) = send(
        &app.router,
        Method::PATCH,
        "/user/preferences",
        Some(&app.ada),
        Some(json!({ "theme": "dark", "week_start": "monday" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs, json!({ "theme": "dark", "week_start": "monday" }));

    let (_, _, prefs) = send(
        &app.router,
        Method::PATCH,
        "/user/preferences",
        Some(&app.ada),
        Some(json!({ "week_start": null })),
    )
    .await;
    assert_eq!(prefs, json!({ "theme": "dark" }));

    let (status, _, _) = send(
        &app.router,
        Method::PATCH,
        "/user/preferences",
        Some(&app.ada),
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, bobs) = send(
        &app.router,
        Method::GET,
        "/user/preferences",
        Some(&app.bob),
        None,
    )
    .await;
    assert_eq!(bobs, json!({}));
}
