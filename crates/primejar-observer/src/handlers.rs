//! REST endpoint handlers for the request gateway.
//!
//! The gateway is the poll-based fallback transport: it must stay fully
//! usable with no push connection at all. Reads have no side effects;
//! the step command advances shared state through the same path the
//! push channel uses.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/current` | Current counter value |
//! | `GET`/`POST` | `/step` | Advance the counter to the next prime |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::error::ObserverError;
use crate::state::AppState;

/// Response body for `GET /current`.
///
/// The field name is the original device's wire name.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CurrentResponse {
    /// The current counter value.
    pub currentnumber: u64,
}

/// Serve a minimal HTML page showing device status and API links.
///
/// The real odometer front-end is served as a static asset elsewhere;
/// this page exists so a bare browser hit shows signs of life.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let current = state.engine.current().await;
    let observers = state.registry.connection_count().await;
    let name = &state.device_name;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{name}</title>
    <style>
        body {{
            background: #10140f;
            color: #d6e2cf;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 640px;
            margin: 0 auto;
        }}
        h1 {{ color: #9ccc65; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #1a211a;
            border: 1px solid #33402f;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #86927f; font-size: 0.85rem; }}
        .metric .value {{ color: #9ccc65; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #9ccc65; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>{name}</h1>

    <div>
        <div class="metric">
            <div class="label">Current number</div>
            <div class="value">{current}</div>
        </div>
        <div class="metric">
            <div class="label">Push observers</div>
            <div class="value">{observers}</div>
        </div>
    </div>

    <h2>API</h2>
    <ul>
        <li><a href="/current">GET /current</a> -- current counter value</li>
        <li><a href="/step">GET|POST /step</a> -- advance to the next prime</li>
    </ul>

    <h2>Push channel</h2>
    <ul>
        <li><code>ws://host:pushport/</code> (subprotocol <code>arduino</code>) -- live counter stream</li>
    </ul>
</body>
</html>"#
    ))
}

/// Return the current counter value.
///
/// Idempotent: repeated calls with no intervening step return the same
/// value.
pub async fn current(State(state): State<Arc<AppState>>) -> Json<CurrentResponse> {
    let currentnumber = state.engine.current().await;
    Json(CurrentResponse { currentnumber })
}

/// Advance the counter to the next prime.
///
/// Side-effecting and not idempotent: each call advances shared state.
/// Responds with an empty JSON object (the original wire contract); the
/// landing value reaches observers through the push channel or the next
/// poll.
pub async fn step(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.command_step().await?;
    Ok(Json(serde_json::json!({})))
}
