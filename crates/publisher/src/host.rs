//! Host framework seam.
//!
//! The host server framework owns module lists, deltas, and persisted
//! publish state. [`HostServer`] is the surface this crate consumes;
//! [`InMemoryServer`] is a reference implementation used by tests and the
//! CLI driver.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use events::{Event, EventBus, EventEnvelope};
use wharf_core::{ModulePath, PublishState, ResourceDelta, RunState, ServerInfo};

/// State and callback surface of the host server framework.
///
/// State setters are plain writes; the host is responsible for persisting
/// them across publish rounds.
pub trait HostServer: Send + Sync {
    fn id(&self) -> Uuid;
    fn name(&self) -> String;

    fn run_state(&self) -> RunState;
    fn set_run_state(&self, state: RunState);

    /// Server-level publish state recorded at the end of a round.
    fn publish_state(&self) -> PublishState;
    fn set_publish_state(&self, state: PublishState);

    fn module_publish_state(&self, module: &ModulePath) -> PublishState;
    fn set_module_publish_state(&self, module: &ModulePath, state: PublishState);

    fn module_run_state(&self, module: &ModulePath) -> RunState;
    fn set_module_run_state(&self, module: &ModulePath, state: RunState);

    /// All modules currently targeted at this server.
    fn modules(&self) -> Vec<ModulePath>;

    /// Modules the host knows were removed since the last publish.
    fn removed_modules(&self) -> Vec<ModulePath>;

    /// Changed resources inside a module since the last publish.
    fn resource_delta(&self, module: &ModulePath) -> Vec<ResourceDelta>;

    /// Whether the host holds publish information for the module.
    fn has_been_published(&self, module: &ModulePath) -> bool;

    /// Source directory of the module's content, when known.
    fn module_root(&self, module: &ModulePath) -> Option<PathBuf>;
}

#[derive(Default)]
struct HostState {
    run_state: RunState,
    publish_state: PublishState,
    modules: Vec<ModulePath>,
    removed: Vec<ModulePath>,
    roots: HashMap<ModulePath, PathBuf>,
    module_publish: HashMap<ModulePath, PublishState>,
    module_run: HashMap<ModulePath, RunState>,
    deltas: HashMap<ModulePath, Vec<ResourceDelta>>,
    published: HashSet<ModulePath>,
    run_state_log: Vec<RunState>,
}

/// In-memory [`HostServer`] that records every state write and notifies an
/// optional event bus of run-state changes.
pub struct InMemoryServer {
    info: ServerInfo,
    bus: Option<EventBus>,
    state: RwLock<HostState>,
}

impl InMemoryServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ServerInfo::new(name),
            bus: None,
            state: RwLock::new(HostState::default()),
        }
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Register a module, optionally with the directory holding its content.
    pub fn add_module(&self, module: ModulePath, root: Option<PathBuf>) {
        let mut state = self.write();
        if let Some(root) = root {
            state.roots.insert(module.clone(), root);
        }
        state.modules.push(module);
    }

    /// Record that a module disappeared from the workspace.
    pub fn mark_removed(&self, module: ModulePath) {
        let mut state = self.write();
        state.modules.retain(|m| *m != module);
        state.removed.push(module);
    }

    pub fn set_resource_delta(&self, module: ModulePath, deltas: Vec<ResourceDelta>) {
        self.write().deltas.insert(module, deltas);
    }

    /// Every run state this server was set to, in order.
    pub fn run_state_log(&self) -> Vec<RunState> {
        self.read().run_state_log.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HostState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HostState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostServer for InMemoryServer {
    fn id(&self) -> Uuid {
        self.info.id
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn run_state(&self) -> RunState {
        self.read().run_state
    }

    fn set_run_state(&self, state: RunState) {
        {
            let mut inner = self.write();
            inner.run_state = state;
            inner.run_state_log.push(state);
        }
        if let Some(bus) = &self.bus {
            bus.publish(EventEnvelope::new(Event::ServerStateChanged {
                server_id: self.info.id,
                state,
            }));
        }
    }

    fn publish_state(&self) -> PublishState {
        self.read().publish_state
    }

    fn set_publish_state(&self, state: PublishState) {
        self.write().publish_state = state;
    }

    fn module_publish_state(&self, module: &ModulePath) -> PublishState {
        self.read()
            .module_publish
            .get(module)
            .copied()
            .unwrap_or_default()
    }

    fn set_module_publish_state(&self, module: &ModulePath, state: PublishState) {
        let mut inner = self.write();
        inner.module_publish.insert(module.clone(), state);
        inner.published.insert(module.clone());
    }

    fn module_run_state(&self, module: &ModulePath) -> RunState {
        self.read()
            .module_run
            .get(module)
            .copied()
            .unwrap_or_default()
    }

    fn set_module_run_state(&self, module: &ModulePath, state: RunState) {
        self.write().module_run.insert(module.clone(), state);
    }

    fn modules(&self) -> Vec<ModulePath> {
        self.read().modules.clone()
    }

    fn removed_modules(&self) -> Vec<ModulePath> {
        self.read().removed.clone()
    }

    fn resource_delta(&self, module: &ModulePath) -> Vec<ResourceDelta> {
        self.read().deltas.get(module).cloned().unwrap_or_default()
    }

    fn has_been_published(&self, module: &ModulePath) -> bool {
        self.read().published.contains(module)
    }

    fn module_root(&self, module: &ModulePath) -> Option<PathBuf> {
        self.read().roots.get(module).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wharf_core::ModuleDelta;

    #[test]
    fn test_initial_state() {
        let server = InMemoryServer::new("staging");
        assert_eq!(server.run_state(), RunState::Unknown);
        assert_eq!(server.publish_state(), PublishState::Synced);
        assert!(server.modules().is_empty());
    }

    #[test]
    fn test_module_state_defaults() {
        let server = InMemoryServer::new("staging");
        let module = ModulePath::root("webapp");

        assert_eq!(server.module_publish_state(&module), PublishState::Synced);
        assert_eq!(server.module_run_state(&module), RunState::Unknown);
        assert!(!server.has_been_published(&module));
    }

    #[test]
    fn test_module_publish_state_marks_published() {
        let server = InMemoryServer::new("staging");
        let module = ModulePath::root("webapp");

        server.set_module_publish_state(&module, PublishState::NeedsFull);
        assert_eq!(server.module_publish_state(&module), PublishState::NeedsFull);
        assert!(server.has_been_published(&module));
    }

    #[test]
    fn test_run_state_log() {
        let server = InMemoryServer::new("staging");
        server.set_run_state(RunState::Starting);
        server.set_run_state(RunState::Started);

        assert_eq!(server.run_state(), RunState::Started);
        assert_eq!(
            server.run_state_log(),
            vec![RunState::Starting, RunState::Started]
        );
    }

    #[test]
    fn test_run_state_change_notifies_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let server = InMemoryServer::new("staging").with_event_bus(bus);

        server.set_run_state(RunState::Stopped);

        let envelope = rx.try_recv().unwrap();
        match envelope.event {
            Event::ServerStateChanged { server_id, state } => {
                assert_eq!(server_id, server.id());
                assert_eq!(state, RunState::Stopped);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_mark_removed() {
        let server = InMemoryServer::new("staging");
        let module = ModulePath::root("webapp");
        server.add_module(module.clone(), None);
        assert_eq!(server.modules().len(), 1);

        server.mark_removed(module.clone());
        assert!(server.modules().is_empty());
        assert_eq!(server.removed_modules(), vec![module]);
    }

    #[test]
    fn test_resource_delta() {
        let server = InMemoryServer::new("staging");
        let module = ModulePath::root("webapp");
        assert!(server.resource_delta(&module).is_empty());

        server.set_resource_delta(
            module.clone(),
            vec![ResourceDelta::new("index.html", ModuleDelta::Changed)],
        );
        assert_eq!(server.resource_delta(&module).len(), 1);
    }
}
