//! Network surface for the Jar of Primes.
//!
//! This crate provides the two transports observers use to stay in sync
//! with the counter:
//!
//! - **Request gateway** (Axum REST): `GET /current` for polling reads,
//!   `GET|POST /step` for commands, plus a minimal HTML status page.
//! - **Push channel** (`WebSocket`, subprotocol `arduino`, own port):
//!   bare numeric text frames carry new counter values; client text
//!   `"step"` commands a step.
//!
//! # Architecture
//!
//! Both transports share one [`AppState`]: every step goes through
//! [`AppState::command_step`], which executes the search on the engine
//! and announces the landing prime exactly once over a
//! [`tokio::sync::broadcast`] channel. Push connections are tracked in a
//! [`ConnectionRegistry`] and probed by a two-strike liveness sweep; a
//! connection that misses a full probe interval is terminated.
//!
//! [`AppState`]: state::AppState
//! [`AppState::command_step`]: state::AppState::command_step
//! [`ConnectionRegistry`]: hub::ConnectionRegistry

pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::{build_push_router, build_router};
pub use server::{ServerConfig, ServerError, start_push_server, start_server};
pub use startup::{ObserverHandles, StartupError, spawn_observer};
pub use state::AppState;
