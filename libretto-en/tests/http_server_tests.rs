//! HTTP server and routing integration tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use libretto_common::config::EnsembleDefaults;
use libretto_en::config::ServiceConfig;
use libretto_en::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Create test app state with an empty source table
fn test_app_state() -> AppState {
    let config = ServiceConfig {
        port: 0,
        defaults: EnsembleDefaults::default(),
        sources: vec![],
    };
    AppState::new(config).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_route() {
    let app = build_router(test_app_state());

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
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "libretto-en");
    assert_eq!(body["configured_sources"], 0);
}

#[tokio::test]
async fn test_version_route() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/version")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommend_with_no_sources_is_bad_request() {
    // Empty configured table and no request-level sources
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend/ensemble")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "playlist_ids": [1, 2] })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_recommend_with_empty_playlist_is_bad_request() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend/ensemble")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "playlist_ids": [],
                        "sources": [
                            { "name": "s1", "endpoint": "http://localhost:1/x" }
                        ]
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_rejects_non_json_body() {
    let app = build_router(test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend/ensemble")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
