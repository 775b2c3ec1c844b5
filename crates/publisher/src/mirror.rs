//! Server run-state mirror.
//!
//! Keeps a locally cached run state alongside the host's authoritative
//! state. The cache is what lets the listener tell apart state changes this
//! component made itself from changes forced by the host framework.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use events::{Event, EventBus};
use wharf_core::RunState;

use crate::behavior::DeployBehavior;
use crate::host::HostServer;

pub struct StateMirror {
    host: Arc<dyn HostServer>,
    cached: RunState,
}

impl StateMirror {
    /// Create a mirror seeded with the host's current run state.
    pub fn new(host: Arc<dyn HostServer>) -> Self {
        let cached = host.run_state();
        Self { host, cached }
    }

    /// The last state this component set (or observed at creation).
    pub fn cached(&self) -> RunState {
        self.cached
    }

    fn set(&mut self, state: RunState) {
        self.cached = state;
        self.host.set_run_state(state);
    }

    pub fn set_starting(&mut self) {
        self.set(RunState::Starting);
    }

    pub fn set_started(&mut self) {
        self.set(RunState::Started);
    }

    pub fn set_stopping(&mut self) {
        self.set(RunState::Stopping);
    }

    pub fn set_stopped(&mut self) {
        self.set(RunState::Stopped);
    }

    /// React to a run-state notification from the host framework.
    ///
    /// Returns `true` when the host reports the server stopped while the
    /// cache still says starting: the startup was killed out from under us
    /// and a forced stop is required. States matching the cache originated
    /// from our own setters and are ignored.
    pub fn observe(&mut self, reported: RunState) -> bool {
        if reported == self.cached {
            return false;
        }
        self.cached == RunState::Starting && reported == RunState::Stopped
    }
}

/// Pump `ServerStateChanged` events from the bus into a shared behavior.
///
/// The subscription lives as long as the returned task; aborting the task
/// tears the listener down.
pub fn watch_server_events(
    behavior: Arc<Mutex<DeployBehavior>>,
    bus: &EventBus,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if let Event::ServerStateChanged { server_id, state } = envelope.event {
                        let mut behavior = behavior.lock().await;
                        if behavior.server_id() != server_id {
                            continue;
                        }
                        behavior.handle_server_event(state);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Server event watcher lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Server event watcher stopped");
    })
}
