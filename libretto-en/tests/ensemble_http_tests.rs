//! End-to-end tests against live local scoring sources
//!
//! Each test spins up real axum listeners on ephemeral ports standing in for
//! scoring services, then drives the ensemble either through the HTTP
//! surface or through the source client directly.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use libretto_common::api::PlaylistId;
use libretto_common::config::EnsembleDefaults;
use libretto_en::config::ServiceConfig;
use libretto_en::services::HttpScoreSource;
use libretto_en::types::{EnsembleError, ScoreSource, SourceConfig};
use libretto_en::{build_router, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

/// Spawn a mock scoring source returning a canned response
async fn spawn_source(status: StatusCode, response: Value) -> String {
    spawn_source_with_delay(status, response, Duration::ZERO).await
}

/// Spawn a mock scoring source that stalls before answering
async fn spawn_source_with_delay(status: StatusCode, response: Value, delay: Duration) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/recommend",
        post(move || {
            let response = response.clone();
            async move {
                tokio::time::sleep(delay).await;
                (status, Json(response))
            }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/recommend", addr)
}

fn record(isbn: &str, similarity: f64) -> Value {
    json!({
        "isbn": isbn,
        "title": format!("Title {}", isbn),
        "author": "Author",
        "description": "Description",
        "similarity": similarity,
    })
}

fn test_app_state() -> AppState {
    let config = ServiceConfig {
        port: 0,
        defaults: EnsembleDefaults::default(),
        sources: vec![],
    };
    AppState::new(config).unwrap()
}

async fn post_recommend(body: Value) -> (StatusCode, Value) {
    let app = build_router(test_app_state());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend/ensemble")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn source_client(name: &str, endpoint: &str) -> HttpScoreSource {
    HttpScoreSource::new(
        &SourceConfig {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            weight: None,
        },
        reqwest::Client::new(),
        Duration::from_secs(5),
    )
}

// ============================================================================
// Full-surface aggregation scenarios
// ============================================================================

#[tokio::test]
async fn test_two_sources_merge_and_rank_over_http() {
    let s1 = spawn_source(
        StatusCode::OK,
        json!([record("X", 10.0), record("Y", 0.0)]),
    )
    .await;
    let s2 = spawn_source(StatusCode::OK, json!([record("X", 5.0)])).await;

    let (status, body) = post_recommend(json!({
        "playlist_ids": [1, 2, 3],
        "sources": [
            { "name": "S1", "endpoint": s1, "weight": 0.5 },
            { "name": "S2", "endpoint": s2, "weight": 0.5 }
        ]
    }))
    .await;

    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["isbn"], "X");
    assert!((results[0]["score_final"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(
        results[0]["models_contributing"],
        json!(["S1", "S2"])
    );
    assert_eq!(results[1]["isbn"], "Y");
    assert_eq!(results[1]["score_final"].as_f64().unwrap(), 0.0);
    assert!(body["failed_sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_top_k_final_limits_http_response() {
    let s1 = spawn_source(
        StatusCode::OK,
        json!([record("X", 10.0), record("Y", 0.0)]),
    )
    .await;
    let s2 = spawn_source(StatusCode::OK, json!([record("X", 5.0)])).await;

    let (status, body) = post_recommend(json!({
        "playlist_ids": [1, 2, 3],
        "top_k_final": 1,
        "sources": [
            { "name": "S1", "endpoint": s1, "weight": 0.5 },
            { "name": "S2", "endpoint": s2, "weight": 0.5 }
        ]
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["isbn"], "X");
}

#[tokio::test]
async fn test_timeout_with_fail_fast_is_bad_gateway() {
    let good = spawn_source(StatusCode::OK, json!([record("X", 1.0)])).await;
    let slow = spawn_source_with_delay(
        StatusCode::OK,
        json!([record("Z", 1.0)]),
        Duration::from_secs(3),
    )
    .await;

    let (status, body) = post_recommend(json!({
        "playlist_ids": [1],
        "timeout_seconds": 1,
        "fail_fast": true,
        "sources": [
            { "name": "good", "endpoint": good },
            { "name": "slow", "endpoint": slow }
        ]
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "SOURCE_FAILURE");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("slow"));
}

#[tokio::test]
async fn test_timeout_with_best_effort_returns_survivors() {
    let good = spawn_source(
        StatusCode::OK,
        json!([record("X", 2.0), record("Y", 1.0)]),
    )
    .await;
    let slow = spawn_source_with_delay(
        StatusCode::OK,
        json!([record("Z", 1.0)]),
        Duration::from_secs(3),
    )
    .await;

    let (status, body) = post_recommend(json!({
        "playlist_ids": [1],
        "timeout_seconds": 1,
        "fail_fast": false,
        "sources": [
            { "name": "good", "endpoint": good },
            { "name": "slow", "endpoint": slow }
        ]
    }))
    .await;

    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result["models_contributing"], json!(["good"]));
    }

    let failed = body["failed_sources"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["source"], "slow");
}

#[tokio::test]
async fn test_empty_source_list_rejected_without_network() {
    let (status, body) = post_recommend(json!({
        "playlist_ids": [1, 2],
        "sources": []
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Source client wire contract
// ============================================================================

#[tokio::test]
async fn test_client_accepts_wrapped_record_list() {
    let endpoint = spawn_source(
        StatusCode::OK,
        json!({ "recommendations": [record("A", 1.0), record("B", 0.5)] }),
    )
    .await;

    let result = source_client("s1", &endpoint)
        .fetch(&[PlaylistId::Int(1)], 10)
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 2);
    assert_eq!(result.candidates[0].isbn, "A");
    assert_eq!(result.dropped_records, 0);
}

#[tokio::test]
async fn test_client_drops_malformed_records_keeps_rest() {
    let endpoint = spawn_source(
        StatusCode::OK,
        json!([
            record("A", 1.0),
            { "title": "No key", "author": "A", "description": "D", "similarity": 0.9 },
            record("B", 0.5),
        ]),
    )
    .await;

    let result = source_client("s1", &endpoint)
        .fetch(&[PlaylistId::Int(1)], 10)
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 2);
    assert_eq!(result.dropped_records, 1);
}

#[tokio::test]
async fn test_client_all_records_invalid_is_schema_error() {
    let endpoint = spawn_source(
        StatusCode::OK,
        json!([
            { "title": "No key", "similarity": 0.9 },
            { "title": "Also no key", "similarity": 0.1 },
        ]),
    )
    .await;

    let err = source_client("s1", &endpoint)
        .fetch(&[PlaylistId::Int(1)], 10)
        .await
        .unwrap_err();

    assert!(matches!(err, EnsembleError::SourceSchema { .. }));
}

#[tokio::test]
async fn test_client_unrecognized_body_is_schema_error() {
    let endpoint = spawn_source(StatusCode::OK, json!({ "payload": "unexpected" })).await;

    let err = source_client("s1", &endpoint)
        .fetch(&[PlaylistId::Int(1)], 10)
        .await
        .unwrap_err();

    assert!(matches!(err, EnsembleError::SourceSchema { .. }));
}

#[tokio::test]
async fn test_client_non_success_status_is_http_error() {
    let endpoint = spawn_source(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;

    let err = source_client("s1", &endpoint)
        .fetch(&[PlaylistId::Int(1)], 10)
        .await
        .unwrap_err();

    match err {
        EnsembleError::SourceHttp { source, message } => {
            assert_eq!(source, "s1");
            assert!(message.contains("500"));
        }
        other => panic!("expected SourceHttp, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_string_playlist_ids_pass_through() {
    let endpoint = spawn_source(StatusCode::OK, json!([record("A", 1.0)])).await;

    let result = source_client("s1", &endpoint)
        .fetch(
            &[
                PlaylistId::Str("track-1".to_string()),
                PlaylistId::Int(2),
            ],
            5,
        )
        .await
        .unwrap();

    assert_eq!(result.candidates.len(), 1);
}
