//! The client session: transport selection, reconnection, and the
//! animation tick loop.
//!
//! A session owns one [`Reconciler`] and moves through three phases:
//!
//! - **`PersistentlyConnected`** -- the push channel is open. Polling is
//!   fully suspended; pushed values drive the reconciler directly, and
//!   a keep-warm ping goes out on a short fixed interval.
//! - **`Reconnecting`** -- the push connection failed or dropped. A
//!   fixed backoff elapses before the next attempt; only one attempt is
//!   ever outstanding.
//! - **`Polling`** -- the interim fallback while the backoff runs: the
//!   gateway is polled on a fixed interval, gated so a fetch never
//!   lands while an animation run is still draining.
//!
//! Step commands enter through a [`StepHandle`] and are routed over the
//! preferred transport for the current phase -- never both.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use futures::{SinkExt, StreamExt};

use primejar_core::config::ClientConfig;

use crate::display::CounterDisplay;
use crate::poll::PollSource;
use crate::push::{self, PushConnection, PushEvent};
use crate::reconciler::Reconciler;
use crate::source::UpdateSource;

/// Buffered step requests; a device this slow does not need more.
const STEP_REQUEST_BUFFER: usize = 4;

/// The session's connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Polling the gateway as the fallback transport.
    Polling,

    /// The push channel is open; polling is suspended.
    PersistentlyConnected,

    /// Waiting out the backoff before the next connection attempt.
    Reconnecting,
}

/// Cadences and addresses for a client session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gateway base URL, e.g. `http://jar.local:8080`.
    pub gateway_url: String,

    /// Push channel URL, e.g. `ws://jar.local:8081/`.
    pub push_url: String,

    /// Interval between polls while no push channel is available.
    /// [`Duration::ZERO`] disables polling entirely.
    pub poll_interval: Duration,

    /// Interval between keep-warm pings on the push channel.
    pub ping_interval: Duration,

    /// Backoff before retrying a failed push connection.
    pub reconnect_delay: Duration,

    /// Cadence of animated counter increments.
    pub animation_step: Duration,
}

impl SessionConfig {
    /// Build a session config from the device's client cadence settings.
    pub fn from_client_config(
        gateway_url: impl Into<String>,
        push_url: impl Into<String>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            push_url: push_url.into(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            animation_step: Duration::from_millis(config.animation_step_ms),
        }
    }
}

/// Handle for requesting steps from outside the session task.
#[derive(Debug, Clone)]
pub struct StepHandle {
    /// Channel into the session loop.
    tx: mpsc::Sender<()>,
}

impl StepHandle {
    /// Request a step. Returns `false` if the session is gone or the
    /// request buffer is full (the jar steps at its own pace anyway).
    pub fn request_step(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// A running client session.
pub struct ClientSession<D: CounterDisplay> {
    /// Session cadences and addresses.
    config: SessionConfig,

    /// The poll fallback transport.
    poll: PollSource,

    /// Display-state reconciliation.
    reconciler: Reconciler<D>,

    /// Current connection phase.
    phase: ConnectionPhase,

    /// Incoming step requests.
    step_requests: mpsc::Receiver<()>,
}

impl<D: CounterDisplay> ClientSession<D> {
    /// Create a session and the step handle that feeds it.
    pub fn new(config: SessionConfig, display: D) -> (Self, StepHandle) {
        let (tx, step_requests) = mpsc::channel(STEP_REQUEST_BUFFER);
        let poll = PollSource::new(config.gateway_url.clone());
        let session = Self {
            config,
            poll,
            reconciler: Reconciler::new(display),
            phase: ConnectionPhase::Polling,
            step_requests,
        };
        (session, StepHandle { tx })
    }

    /// Return the current connection phase.
    pub const fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Run the session until the task is aborted.
    ///
    /// Nothing in here is fatal: connection failures back off and
    /// retry, request failures mean "no update this cycle," and desyncs
    /// snap the display. The session is meant to run unattended for as
    /// long as the jar does.
    pub async fn run(&mut self) {
        // First contact: fetch once and display without animation.
        match self.poll.fetch_current().await {
            Ok(value) => self.reconciler.initialize(value),
            Err(e) => warn!(error = %e, "initial fetch failed, starting from 0"),
        }

        loop {
            match PushConnection::connect(&self.config.push_url).await {
                Ok(connection) => {
                    self.phase = ConnectionPhase::PersistentlyConnected;
                    info!(url = self.config.push_url, "push channel open, polling suspended");
                    self.run_connected(connection).await;
                    info!("push channel lost");
                }
                Err(e) => {
                    warn!(error = %e, "push connection failed");
                }
            }

            self.phase = ConnectionPhase::Reconnecting;
            debug!(
                delay_secs = self.config.reconnect_delay.as_secs(),
                "backing off before reconnect"
            );
            self.poll_through_backoff().await;
        }
    }

    /// Drive the session while the push channel is open.
    ///
    /// Returns when the connection drops for any reason; the caller
    /// handles the phase change and backoff.
    async fn run_connected(&mut self, connection: PushConnection) {
        let PushConnection {
            mut sink,
            mut stream,
        } = connection;

        let mut ping = tokio::time::interval(self.config.ping_interval);
        let mut animation = tokio::time::interval(self.config.animation_step);

        let reconciler = &mut self.reconciler;
        let step_requests = &mut self.step_requests;
        let mut step_handle_open = true;

        loop {
            tokio::select! {
                // A frame from the device.
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Ping(data))) => {
                            // The device's liveness probe; the pong is
                            // what keeps this connection off the kill
                            // list.
                            if sink.send(Message::Pong(data)).await.is_err() {
                                return;
                            }
                        }
                        Some(Ok(message)) => match push::parse_frame(&message) {
                            Some(PushEvent::Value(value)) => reconciler.observe(value),
                            Some(PushEvent::Closed) => return,
                            None => {}
                        },
                        Some(Err(e)) => {
                            debug!(error = %e, "push channel error");
                            return;
                        }
                        None => return,
                    }
                }
                // Keep-warm ping; the first fires immediately on open.
                _ = ping.tick() => {
                    if push::send_keep_warm_ping(&mut sink).await.is_err() {
                        return;
                    }
                }
                // One animated increment per cadence tick.
                _ = animation.tick() => {
                    reconciler.drive_tick();
                }
                // A user-initiated step, routed over the push channel.
                request = step_requests.recv(), if step_handle_open => {
                    match request {
                        Some(()) => {
                            if let Err(e) = UpdateSource::Push(&mut sink).command_step().await {
                                warn!(error = %e, "step command failed");
                                return;
                            }
                            // The resulting push frame is the same
                            // logical event; the reconciler absorbs it.
                        }
                        None => step_handle_open = false,
                    }
                }
            }
        }
    }

    /// Poll the gateway while the reconnect backoff elapses.
    async fn poll_through_backoff(&mut self) {
        self.phase = ConnectionPhase::Polling;

        let now = tokio::time::Instant::now();
        let deadline = now.checked_add(self.config.reconnect_delay).unwrap_or(now);
        let polling_enabled = self.config.poll_interval > Duration::ZERO;
        // The interval still needs a nonzero period when polling is
        // disabled; the guard keeps the arm from ever firing.
        let poll_period = if polling_enabled {
            self.config.poll_interval
        } else {
            self.config.reconnect_delay
        };
        let mut poll_timer = tokio::time::interval(poll_period);
        let mut animation = tokio::time::interval(self.config.animation_step);

        let reconciler = &mut self.reconciler;
        let poll = &self.poll;
        let step_requests = &mut self.step_requests;
        let mut step_handle_open = true;

        loop {
            tokio::select! {
                // Backoff elapsed; time to retry the push channel.
                () = tokio::time::sleep_until(deadline) => return,
                // Scheduled poll, gated on the animation queue: a fetch
                // must not land while a run is still draining.
                _ = poll_timer.tick(), if polling_enabled => {
                    if !reconciler.is_draining() {
                        match poll.fetch_current().await {
                            Ok(value) => reconciler.observe(value),
                            Err(e) => {
                                debug!(error = %e, "poll failed, no update this cycle");
                            }
                        }
                    }
                }
                _ = animation.tick() => {
                    reconciler.drive_tick();
                }
                // A user-initiated step, routed over the gateway.
                request = step_requests.recv(), if step_handle_open => {
                    match request {
                        Some(()) => {
                            match UpdateSource::Pull(poll).command_step().await {
                                Ok(()) => {
                                    // Mirror the original client: after a
                                    // polled step, fetch right away rather
                                    // than waiting a full interval.
                                    if !reconciler.is_draining() {
                                        if let Ok(value) = poll.fetch_current().await {
                                            reconciler.observe(value);
                                        }
                                    }
                                }
                                Err(e) => warn!(error = %e, "step command rejected"),
                            }
                        }
                        None => step_handle_open = false,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TracingDisplay;

    #[test]
    fn session_config_converts_cadences() {
        let client = ClientConfig::default();
        let config = SessionConfig::from_client_config(
            "http://jar.local:8080",
            "ws://jar.local:8081/",
            &client,
        );
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.ping_interval, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(10));
        assert_eq!(config.animation_step, Duration::from_millis(150));
    }

    #[test]
    fn new_session_starts_in_polling_phase() {
        let client = ClientConfig::default();
        let config = SessionConfig::from_client_config(
            "http://jar.local:8080",
            "ws://jar.local:8081/",
            &client,
        );
        let (session, handle) = ClientSession::new(config, TracingDisplay::new());
        assert_eq!(session.phase(), ConnectionPhase::Polling);
        // The handle can queue a request even before the session runs.
        assert!(handle.request_step());
    }
}
