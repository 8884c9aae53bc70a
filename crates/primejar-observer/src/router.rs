//! Axum router construction for the gateway and the push listener.
//!
//! The jar exposes two listeners, matching the original device's
//! HTTP/WebSocket port split: the request gateway carries the poll-based
//! REST surface, and the push listener carries nothing but the
//! persistent channel upgrade at its root.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the request gateway router.
///
/// Routes:
/// - `GET /` -- minimal HTML status page
/// - `GET /current` -- current counter value
/// - `GET|POST /step` -- advance to the next prime
///
/// CORS allows any origin so a dashboard served from elsewhere can poll
/// the jar during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/current", get(handlers::current))
        // The original device accepts both methods for a step.
        .route("/step", get(handlers::step).post(handlers::step))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the push listener router: a single `WebSocket` upgrade route.
pub fn build_push_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ws::ws_push))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
