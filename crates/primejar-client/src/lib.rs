//! Client-side synchronization for the Jar of Primes.
//!
//! A client mirrors a counter that advances on the device, out of step
//! with anything the client does. This crate keeps that mirror honest:
//!
//! - [`reconciler`] -- merges pushed and polled values into one
//!   authoritative view and drives animated catch-up, one increment per
//!   tick, never a jump (except for desync recovery, which snaps)
//! - [`display`] -- the [`CounterDisplay`] seam to whatever renders the
//!   odometer
//! - [`push`] / [`poll`] -- the two transports: persistent `WebSocket`
//!   channel (preferred) and HTTP polling (fallback)
//! - [`source`] -- [`UpdateSource`], the per-command transport choice
//! - [`session`] -- [`ClientSession`], the loop tying it all together
//!   with fixed-backoff reconnection
//!
//! The `jar-monitor` binary runs a session against a live jar with a
//! log-stream display.
//!
//! [`CounterDisplay`]: display::CounterDisplay
//! [`UpdateSource`]: source::UpdateSource
//! [`ClientSession`]: session::ClientSession

pub mod display;
pub mod error;
pub mod poll;
pub mod push;
pub mod reconciler;
pub mod session;
pub mod source;

// Re-export primary types for convenience.
pub use display::{CounterDisplay, TracingDisplay};
pub use error::ClientError;
pub use poll::PollSource;
pub use push::{PUSH_SUBPROTOCOL, PushConnection, PushEvent};
pub use reconciler::Reconciler;
pub use session::{ClientSession, ConnectionPhase, SessionConfig, StepHandle};
pub use source::UpdateSource;
