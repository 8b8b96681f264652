//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use nova_assistant::api::ApiServerBuilder;
use nova_assistant::db::CommandLogRepo;
use tower::ServiceExt;

mod common;
use common::setup_test_db;

/// Build a test API router with a command log
fn build_test_router(repo: &CommandLogRepo) -> axum::Router {
    ApiServerBuilder::new(0)
        .command_log(repo.clone())
        .build()
        .router()
}

fn post_command(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/command")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_command_is_classified_and_logged() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app
        .oneshot(post_command(r#"{"command": "Open Google", "userId": "user-1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["action"], "SUGGEST_URL");
    assert_eq!(json["data"], "https://www.google.com");

    let records = repo.recent(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].command, "Open Google");
    assert_eq!(records[0].action, "SUGGEST_URL");
    assert_eq!(records[0].user_id.as_deref(), Some("user-1"));
}

#[tokio::test]
async fn test_blank_command_is_rejected() {
    let repo = CommandLogRepo::new(setup_test_db());

    for body in [r#"{"command": "   "}"#, "{}", ""] {
        let response = build_test_router(&repo)
            .oneshot(post_command(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Command is required");
    }

    assert_eq!(repo.count().unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app.oneshot(post_command("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid JSON body");
    assert_eq!(repo.count().unwrap(), 0);
}

#[tokio::test]
async fn test_command_endpoint_rejects_get() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/command")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_history_lists_newest_first() {
    let repo = CommandLogRepo::new(setup_test_db());

    for command in ["hi", "tell me a joke"] {
        let body = serde_json::json!({ "command": command }).to_string();
        let response = build_test_router(&repo)
            .oneshot(post_command(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = build_test_router(&repo)
        .oneshot(
            Request::builder()
                .uri("/api/commands?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["command"], "tell me a joke");
    assert!(entries[0]["createdAt"].is_string());
}

#[tokio::test]
async fn test_history_without_log() {
    let app = ApiServerBuilder::new(0).build().router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/commands")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_voice_capabilities() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/voice/capabilities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["wakeWord"], "nova");
    assert_eq!(json["locale"], "en-US");
    assert_eq!(json["sttAvailable"], false);
    assert_eq!(json["rules"][0], "open_site");
}

#[tokio::test]
async fn test_cors_preflight() {
    let repo = CommandLogRepo::new(setup_test_db());
    let app = build_test_router(&repo);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/command")
                .header(header::ORIGIN, "https://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
