//! Connection registry and liveness protocol for the push channel.
//!
//! Every WebSocket client is registered here as an [`ObserverConnection`]
//! for the lifetime of its socket task. A background sweep probes the set
//! on a fixed interval and terminates connections that stop answering.
//!
//! # Liveness protocol
//!
//! Two-strike, driven by [`ConnectionRegistry::sweep_once`]:
//!
//! 1. A sweep lowers every connection's liveness flag and commands its
//!    socket task to send a protocol Ping frame.
//! 2. A Pong from the client raises the flag again.
//! 3. A connection whose flag is still down at the *next* sweep is
//!    commanded to terminate and dropped from the registry.
//!
//! A connection is therefore never killed by the sweep that probes it --
//! it always gets one full interval to answer. Application-level text
//! messages (including the client's keep-warm `"ping"`) do not touch the
//! flag; only protocol Pong frames count.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Commands the liveness sweep sends to a connection's socket task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCommand {
    /// Send a protocol Ping frame to the client.
    Probe,

    /// Close the socket; the connection failed its liveness check.
    Terminate,
}

/// A registered push-channel observer.
///
/// Created on connection handshake, dropped on disconnect or failed
/// liveness check. The liveness flag starts raised so a fresh connection
/// survives the sweep that first probes it.
#[derive(Debug)]
pub struct ObserverConnection {
    /// Unique connection id.
    id: Uuid,

    /// Raised by Pong frames, lowered by each sweep.
    alive: AtomicBool,

    /// Timestamp of the most recent Pong, for the status page.
    last_pong: Mutex<Option<DateTime<Utc>>>,

    /// Channel to the socket task handling this connection.
    commands: mpsc::Sender<ProbeCommand>,
}

impl ObserverConnection {
    /// Create a connection record wired to the given command channel.
    fn new(commands: mpsc::Sender<ProbeCommand>) -> Self {
        Self {
            id: Uuid::new_v4(),
            alive: AtomicBool::new(true),
            last_pong: Mutex::new(None),
            commands,
        }
    }

    /// Return the connection id.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the connection has confirmed liveness since the last probe.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Record a liveness confirmation (a protocol Pong frame).
    pub async fn confirm_alive(&self) {
        self.alive.store(true, Ordering::Release);
        let mut guard = self.last_pong.lock().await;
        *guard = Some(Utc::now());
    }

    /// Return the timestamp of the most recent Pong, if any.
    pub async fn last_pong(&self) -> Option<DateTime<Utc>> {
        *self.last_pong.lock().await
    }
}

/// Result of one liveness sweep, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Connections probed this sweep.
    pub probed: usize,

    /// Connections terminated this sweep.
    pub terminated: usize,
}

/// The set of live push connections.
///
/// Broadcast delivery itself goes through the shared
/// [`broadcast`](tokio::sync::broadcast) channel; the registry exists so
/// the liveness sweep can iterate the connection set and so the status
/// page can report how many observers are attached.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Registered connections keyed by id.
    connections: RwLock<BTreeMap<Uuid, Arc<ObserverConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its record.
    ///
    /// The caller keeps the returned [`Arc`] for the socket task and
    /// must [`deregister`](Self::deregister) on every exit path.
    pub async fn register(&self, commands: mpsc::Sender<ProbeCommand>) -> Arc<ObserverConnection> {
        let connection = Arc::new(ObserverConnection::new(commands));
        let mut guard = self.connections.write().await;
        guard.insert(connection.id(), Arc::clone(&connection));
        debug!(id = %connection.id(), total = guard.len(), "observer registered");
        connection
    }

    /// Remove a connection from the registry.
    ///
    /// Removing an id that was already swept out is a no-op.
    pub async fn deregister(&self, id: Uuid) {
        let mut guard = self.connections.write().await;
        if guard.remove(&id).is_some() {
            debug!(%id, total = guard.len(), "observer deregistered");
        }
    }

    /// Return the number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Run one liveness sweep over the connection set.
    ///
    /// Connections that never confirmed liveness since the previous
    /// sweep are commanded to terminate and dropped; everyone else has
    /// their flag lowered and gets a probe. Termination commands are
    /// best-effort -- if the socket task is already gone, dropping the
    /// registration is all that is left to do.
    pub async fn sweep_once(&self) -> SweepOutcome {
        // Snapshot under the read lock; connections added mid-sweep are
        // picked up next interval.
        let snapshot: Vec<Arc<ObserverConnection>> =
            self.connections.read().await.values().cloned().collect();

        let mut outcome = SweepOutcome::default();
        let mut expired: Vec<Uuid> = Vec::new();

        for connection in snapshot {
            if connection.is_alive() {
                connection.alive.store(false, Ordering::Release);
                if connection.commands.send(ProbeCommand::Probe).await.is_err() {
                    // Socket task already gone; clean up the record.
                    expired.push(connection.id());
                    continue;
                }
                outcome.probed = outcome.probed.saturating_add(1);
            } else {
                warn!(id = %connection.id(), "observer missed a liveness check, terminating");
                let _ = connection.commands.send(ProbeCommand::Terminate).await;
                expired.push(connection.id());
                outcome.terminated = outcome.terminated.saturating_add(1);
            }
        }

        if !expired.is_empty() {
            let mut guard = self.connections.write().await;
            for id in expired {
                guard.remove(&id);
            }
        }

        outcome
    }
}

/// Run the liveness sweep on a fixed interval until the task is aborted.
///
/// Spawned by the observer startup helper; one sweep task serves all
/// connections.
pub async fn run_liveness_sweep(registry: Arc<ConnectionRegistry>, probe_interval: Duration) {
    info!(interval_secs = probe_interval.as_secs(), "liveness sweep started");
    let mut ticker = tokio::time::interval(probe_interval);
    // The first tick fires immediately; skip it so fresh connections get
    // a full interval before their first probe.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let outcome = registry.sweep_once().await;
        if outcome.probed > 0 || outcome.terminated > 0 {
            debug!(
                probed = outcome.probed,
                terminated = outcome.terminated,
                "liveness sweep completed"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_connection_is_probed_not_terminated() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let connection = registry.register(tx).await;
        assert!(connection.is_alive());

        let outcome = registry.sweep_once().await;
        assert_eq!(outcome, SweepOutcome { probed: 1, terminated: 0 });
        assert_eq!(rx.recv().await.unwrap(), ProbeCommand::Probe);
        assert!(!connection.is_alive());
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn silent_connection_is_terminated_on_second_sweep() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let _connection = registry.register(tx).await;

        // First sweep probes; the client never answers.
        registry.sweep_once().await;
        assert_eq!(rx.recv().await.unwrap(), ProbeCommand::Probe);

        // Second sweep terminates.
        let outcome = registry.sweep_once().await;
        assert_eq!(outcome, SweepOutcome { probed: 0, terminated: 1 });
        assert_eq!(rx.recv().await.unwrap(), ProbeCommand::Terminate);
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn pong_between_sweeps_resets_the_strike() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let connection = registry.register(tx).await;

        registry.sweep_once().await;
        assert_eq!(rx.recv().await.unwrap(), ProbeCommand::Probe);

        // The client answers the probe.
        connection.confirm_alive().await;
        assert!(connection.is_alive());
        assert!(connection.last_pong().await.is_some());

        // Next sweep probes again instead of terminating.
        let outcome = registry.sweep_once().await;
        assert_eq!(outcome, SweepOutcome { probed: 1, terminated: 0 });
        assert_eq!(rx.recv().await.unwrap(), ProbeCommand::Probe);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn deregister_removes_connection() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let connection = registry.register(tx).await;
        assert_eq!(registry.connection_count().await, 1);

        registry.deregister(connection.id()).await;
        assert_eq!(registry.connection_count().await, 0);

        // Deregistering twice is harmless.
        registry.deregister(connection.id()).await;
    }

    #[tokio::test]
    async fn sweep_cleans_up_dead_socket_tasks() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::channel(8);
        let _connection = registry.register(tx).await;
        drop(rx);

        // The command channel is closed; the sweep drops the record
        // without counting it as probed.
        let outcome = registry.sweep_once().await;
        assert_eq!(outcome, SweepOutcome { probed: 0, terminated: 0 });
        assert_eq!(registry.connection_count().await, 0);
    }
}
