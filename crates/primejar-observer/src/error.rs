//! Error types for the request gateway.
//!
//! [`ObserverError`] unifies the gateway's failure modes into a single
//! enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use primejar_core::engine::EngineError;

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The step engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}")),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
