//! Integration tests for the HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Event streams never end on their own, so stream
//! tests call `LocationRelay::shutdown` to close them before reading the
//! body to completion.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use locus_api::router::build_router;
use locus_api::state::AppState;
use locus_api::{ServerConfig, spawn_server};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    Arc::new(AppState::default())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect the JSON payload of every `data:` line in an SSE body.
async fn sse_payloads(body: Body) -> Vec<Value> {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

fn update(driver_id: &str, timestamp: &str) -> Value {
    json!({
        "event": "location_update",
        "data": {
            "driver_id": driver_id,
            "latitude": 40.7128,
            "longitude": -74.006,
            "timestamp": timestamp,
        }
    })
}

async fn post_event(router: &Router, body: &Value) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::post("/event")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(router: &Router, path: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_submit_event_acknowledges() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = post_event(&router, &update("d1", "2024-01-01T00:00:01Z")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Location data received");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(state.relay.stats().records, 1);
}

#[tokio::test]
async fn test_submit_event_rejects_missing_driver_id() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let body = json!({
        "event": "location_update",
        "data": { "latitude": 1.0, "longitude": 2.0, "timestamp": "2024-01-01T00:00:01Z" }
    });
    let response = post_event(&router, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert_eq!(state.relay.stats().records, 0);
}

#[tokio::test]
async fn test_submit_event_rejects_bad_timestamp() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = post_event(&router, &update("d1", "last tuesday")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.relay.stats().records, 0);
}

#[tokio::test]
async fn test_submit_event_rejects_blank_driver_id() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = post_event(&router, &update("  ", "2024-01-01T00:00:01Z")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("driver_id"));
}

#[tokio::test]
async fn test_stream_headers() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = get(&router, "/stream/d1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(
        headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert_eq!(headers.get("cache-control").unwrap(), "no-cache");
    assert_eq!(state.relay.stats().subscribers, 1);
}

#[tokio::test]
async fn test_stream_latest_then_live() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    post_event(&router, &update("d1", "2024-01-01T00:00:01Z")).await;
    post_event(&router, &update("d1", "2024-01-01T00:00:05Z")).await;

    let stream = get(&router, "/stream/d1").await;

    post_event(&router, &update("d1", "2024-01-01T00:00:05Z")).await;
    post_event(&router, &update("d1", "2024-01-01T00:00:07Z")).await;
    post_event(&router, &update("other", "2024-01-01T00:00:09Z")).await;

    state.relay.shutdown();
    let events = sse_payloads(stream.into_body()).await;

    let stamps: Vec<&str> = events
        .iter()
        .map(|e| e["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(stamps, vec!["2024-01-01T00:00:05Z", "2024-01-01T00:00:07Z"]);
    assert!(events.iter().all(|e| e["driver_id"] == "d1"));
}

#[tokio::test]
async fn test_stream_since_replays_history() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    for second in 1..=3 {
        let ts = format!("2024-01-01T00:00:0{second}Z");
        post_event(&router, &update("d1", &ts)).await;
    }

    let stream = get(&router, "/stream/d1?since=2024-01-01T00:00:01Z").await;
    post_event(&router, &update("d1", "2024-01-01T00:00:02Z")).await;
    post_event(&router, &update("d1", "2024-01-01T00:00:04Z")).await;

    state.relay.shutdown();
    let events = sse_payloads(stream.into_body()).await;

    let stamps: Vec<&str> = events
        .iter()
        .map(|e| e["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(
        stamps,
        vec![
            "2024-01-01T00:00:02Z",
            "2024-01-01T00:00:03Z",
            "2024-01-01T00:00:04Z"
        ]
    );
}

#[tokio::test]
async fn test_stream_event_payload_shape() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    post_event(&router, &update("d1", "2024-01-01T02:00:00+02:00")).await;
    let stream = get(&router, "/stream/d1").await;

    state.relay.shutdown();
    let events = sse_payloads(stream.into_body()).await;

    assert_eq!(
        events,
        vec![json!({
            "driver_id": "d1",
            "latitude": 40.7128,
            "longitude": -74.006,
            "timestamp": "2024-01-01T02:00:00+02:00",
        })]
    );
}

#[tokio::test]
async fn test_stream_rejects_bad_since() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = get(&router, "/stream/d1?since=not-a-time").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert_eq!(state.relay.stats().subscribers, 0);
}

#[tokio::test]
async fn test_dropping_stream_unsubscribes() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let stream = get(&router, "/stream/d1").await;
    assert_eq!(state.relay.stats().subscribers, 1);

    drop(stream);
    assert_eq!(state.relay.stats().subscribers, 0);
    assert_eq!(state.relay.stats().streamed_drivers, 0);
}

#[tokio::test]
async fn test_health_reports_counters() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    post_event(&router, &update("a", "2024-01-01T00:00:01Z")).await;
    post_event(&router, &update("b", "2024-01-01T00:00:01Z")).await;
    let _stream = get(&router, "/stream/a").await;

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["drivers"], 2);
    assert_eq!(json["records"], 2);
    assert_eq!(json["subscribers"], 1);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/health")
                .header("origin", "http://dashboard.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let router = build_router(make_test_state());

    let response = get(&router, "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_spawn_server_binds_and_shuts_down() {
    let state = make_test_state();
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let (addr, handle) = spawn_server(&config, Arc::clone(&state), async move {
        let _ = rx.await;
    })
    .await
    .unwrap();

    assert_ne!(addr.port(), 0);
    tx.send(()).unwrap();
    handle.await.unwrap();
}
