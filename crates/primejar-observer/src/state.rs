//! Shared application state for the jar's network surface.
//!
//! [`AppState`] ties the step engine to both transports: the HTTP
//! request gateway and the WebSocket push channel go through
//! [`AppState::command_step`], which is the single place a step is
//! executed and its result announced. That keeps the
//! exactly-one-notification-per-step contract independent of where the
//! command entered.

use std::sync::Arc;

use primejar_core::engine::{EngineError, PrimeEngine, StepResult};
use tokio::sync::broadcast;
use tracing::debug;

use crate::hub::ConnectionRegistry;

/// Capacity of the broadcast channel for counter updates.
///
/// A subscriber that falls behind by more than this many messages
/// receives a [`broadcast::error::RecvError::Lagged`] and skips to the
/// newest value. Delivery is best-effort; a lagged observer
/// simply misses intermediate primes.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// broadcast sender pushes new counter values to all connected push
/// clients; the registry tracks those connections for liveness sweeps.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The step engine owning the shared counter.
    pub engine: Arc<PrimeEngine>,

    /// Broadcast sender for new counter values.
    pub tx: broadcast::Sender<u64>,

    /// Registry of live push connections.
    pub registry: Arc<ConnectionRegistry>,

    /// Human-readable device name, shown on the status page.
    pub device_name: String,
}

impl AppState {
    /// Create application state around an engine.
    pub fn new(engine: Arc<PrimeEngine>, device_name: String) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            engine,
            tx,
            registry: Arc::new(ConnectionRegistry::new()),
            device_name,
        }
    }

    /// Subscribe to counter updates.
    ///
    /// Returns a receiver that yields every value announced after the
    /// subscription, subject to the lag policy of the channel.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Announce a new counter value to all subscribed push clients.
    ///
    /// Returns the number of receivers that got the message. 0 means no
    /// push client is connected, which is not an error.
    pub fn announce(&self, value: u64) -> usize {
        // send fails only when there are zero receivers, which is normal
        // when no push client is connected.
        self.tx.send(value).unwrap_or(0)
    }

    /// Execute a step and announce its landing value.
    ///
    /// This is the only step path for both transports. Exactly one
    /// announcement is made per completed step, carrying only the final
    /// prime; intermediate composites are never announced.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the step search fails (bounded-search
    /// exhaustion; unreachable with a validated modulus).
    pub async fn command_step(&self) -> Result<StepResult, EngineError> {
        let result = self.engine.step().await?;
        let receivers = self.announce(result.new_value);
        debug!(
            new_value = result.new_value,
            receivers, "step announced to push clients"
        );
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use primejar_core::prime::PrimalityRule;

    fn make_state(initial: u64) -> AppState {
        let engine = Arc::new(
            PrimeEngine::new(initial, primejar_core::DEFAULT_MODULUS, PrimalityRule::canonical())
                .unwrap(),
        );
        AppState::new(engine, String::from("test-jar"))
    }

    #[tokio::test]
    async fn announce_without_subscribers_is_not_an_error() {
        let state = make_state(11);
        assert_eq!(state.announce(13), 0);
    }

    #[tokio::test]
    async fn command_step_announces_exactly_once() {
        let state = make_state(11);
        let mut rx = state.subscribe();

        let result = state.command_step().await.unwrap();
        assert_eq!(result.new_value, 13);

        // The landing prime arrives once; the skipped composite (12)
        // never does, and nothing else is queued behind it.
        assert_eq!(rx.recv().await.unwrap(), 13);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn each_step_gets_its_own_announcement() {
        let state = make_state(2);
        let mut rx = state.subscribe();

        state.command_step().await.unwrap();
        state.command_step().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), 3);
        assert_eq!(rx.recv().await.unwrap(), 5);
        assert!(rx.try_recv().is_err());
    }
}
