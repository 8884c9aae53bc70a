//! Integration tests for the request gateway endpoints.
//!
//! Tests drive Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use primejar_core::prime::PrimalityRule;
use primejar_core::{DEFAULT_MODULUS, PrimeEngine};
use primejar_observer::router::build_router;
use primejar_observer::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state(initial: u64) -> Arc<AppState> {
    let engine = Arc::new(
        PrimeEngine::new(initial, DEFAULT_MODULUS, PrimalityRule::canonical()).unwrap(),
    );
    Arc::new(AppState::new(engine, String::from("test-jar")))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = make_test_state(11);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_current_returns_counter_value() {
    let state = make_test_state(11);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/current").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["currentnumber"], 11);
}

#[tokio::test]
async fn test_current_is_idempotent() {
    let state = make_test_state(42);
    let router = build_router(state);

    for _ in 0..3 {
        let response = router
            .clone()
            .oneshot(Request::get("/current").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["currentnumber"], 42);
    }
}

#[tokio::test]
async fn test_step_get_returns_empty_object_and_advances() {
    let state = make_test_state(11);
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(Request::get("/step").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({}));

    // The counter landed on the next prime above 11.
    let response = router
        .oneshot(Request::get("/current").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["currentnumber"], 13);
}

#[tokio::test]
async fn test_step_post_is_accepted() {
    let state = make_test_state(13);
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(Request::post("/step").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/current").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["currentnumber"], 17);
}

#[tokio::test]
async fn test_step_announces_exactly_once_per_call() {
    let state = make_test_state(11);
    let mut rx = state.subscribe();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::post("/step").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // One announcement carrying only the landing prime, nothing for the
    // skipped composite.
    assert_eq!(rx.recv().await.unwrap(), 13);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_steps_from_both_transport_paths_serialize() {
    // Two concurrent step commands through the shared state land on two
    // distinct primes; the searches never interleave.
    let state = make_test_state(2);

    let a = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.command_step().await })
    };
    let b = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.command_step().await })
    };

    let mut landed = vec![
        a.await.unwrap().unwrap().new_value,
        b.await.unwrap().unwrap().new_value,
    ];
    landed.sort_unstable();
    assert_eq!(landed, vec![3, 5]);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let state = make_test_state(11);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
