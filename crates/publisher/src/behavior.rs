//! The deployable server behavior.
//!
//! Owns the publish session lifecycle and the run-state mirror for one
//! server. The host adapter drives it through serialized callbacks:
//! `publish_start`, `publish_module` per affected module, `publish_finish`.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use events::{Event, EventBus, EventEnvelope};
use wharf_core::{
    ModuleDelta, ModulePath, PublishAction, PublishKind, PublishState, ResourceDelta, RunState,
};

use crate::classifier;
use crate::error::{PublishError, Result};
use crate::host::HostServer;
use crate::launch::{LaunchSettings, ACTION_KEY, ACTION_START};
use crate::methods::{LocalMethod, MethodRegistry, PublishMethod};
use crate::mirror::StateMirror;
use crate::prefs::DeploymentPreferences;
use crate::session::PublishSession;

pub struct DeployBehavior {
    host: Arc<dyn HostServer>,
    registry: Arc<MethodRegistry>,
    prefs: DeploymentPreferences,
    deploy_root: PathBuf,
    mirror: StateMirror,
    bus: Option<EventBus>,
    session: Option<PublishSession>,
}

impl DeployBehavior {
    pub fn new(
        host: Arc<dyn HostServer>,
        prefs: DeploymentPreferences,
        deploy_root: impl Into<PathBuf>,
    ) -> Self {
        let mirror = StateMirror::new(Arc::clone(&host));
        Self {
            host,
            registry: Arc::new(MethodRegistry::with_defaults()),
            prefs,
            deploy_root: deploy_root.into(),
            mirror,
            bus: None,
            session: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<MethodRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn server_id(&self) -> Uuid {
        self.host.id()
    }

    pub fn is_publishing(&self) -> bool {
        self.session.is_some()
    }

    /// The bound method's name while a round is in progress.
    pub fn method_name(&self) -> Option<&'static str> {
        self.session.as_ref().map(PublishSession::method_name)
    }

    /// The last run state this behavior set for the server.
    pub fn server_state(&self) -> RunState {
        self.mirror.cached()
    }

    /// Instantiate the method the preferences select, falling back to the
    /// built-in local method when none is configured.
    fn create_method(&self) -> Result<Box<dyn PublishMethod>> {
        match self.prefs.method.as_deref() {
            Some(id) => self.registry.create(id),
            None => Ok(Box::new(LocalMethod::new())),
        }
    }

    /// Begin a publish round: bind a method and give it its start signal.
    pub async fn publish_start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(PublishError::AlreadyPublishing);
        }

        let method = self.create_method()?;
        info!(
            server = %self.host.name(),
            method = method.name(),
            "Publish round starting"
        );
        self.emit(Event::PublishStarted {
            server_id: self.host.id(),
            method: method.name().to_string(),
        });

        let mut session = PublishSession::new(method);
        let started = session.start(self.host.as_ref(), &self.deploy_root).await;
        // The method stays bound even when its start signal fails; the host
        // must finish this round before starting another.
        self.session = Some(session);
        started
    }

    /// Stash session-scoped data for the bound method. No-op outside a
    /// round.
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        if let Some(session) = self.session.as_mut() {
            session.set_data(key, value);
        }
    }

    /// Read session-scoped data. Absent outside a round.
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.session.as_ref().and_then(|s| s.data(key))
    }

    /// Publish one module through the bound method and record the outcome.
    ///
    /// A failure marks the module as needing a full publish, sets its run
    /// state to unknown, and propagates unchanged. Other modules in the
    /// round are unaffected.
    pub async fn publish_module(
        &mut self,
        kind: PublishKind,
        delta: ModuleDelta,
        module: &ModulePath,
    ) -> Result<PublishState> {
        let host = Arc::clone(&self.host);
        let Some(session) = self.session.as_mut() else {
            return Err(PublishError::NotPublishing);
        };

        match session
            .publish_module(host.as_ref(), &self.deploy_root, kind, delta, module)
            .await
        {
            Ok(state) => {
                self.host.set_module_publish_state(module, state);
                self.host.set_module_run_state(module, RunState::Started);
                debug!(module = %module, state = state.as_str(), "Module published");
                self.emit(Event::ModulePublished {
                    server_id: self.host.id(),
                    module: module.clone(),
                    state,
                    success: true,
                });
                Ok(state)
            }
            Err(e) => {
                warn!(module = %module, error = %e, "Module publish failed");
                self.host
                    .set_module_publish_state(module, PublishState::NeedsFull);
                self.host.set_module_run_state(module, RunState::Unknown);
                self.emit(Event::ModulePublished {
                    server_id: self.host.id(),
                    module: module.clone(),
                    state: PublishState::NeedsFull,
                    success: false,
                });
                Err(e)
            }
        }
    }

    /// End the round: let the method finalize, record the overall state,
    /// and release the session.
    pub async fn publish_finish(&mut self) -> Result<PublishState> {
        let host = Arc::clone(&self.host);
        let Some(session) = self.session.as_mut() else {
            return Err(PublishError::NotPublishing);
        };

        // A failing finish leaves the round open.
        let state = session.finish(host.as_ref(), &self.deploy_root).await?;
        self.host.set_publish_state(state);
        self.session = None;

        info!(
            server = %self.host.name(),
            state = state.as_str(),
            "Publish round finished"
        );
        self.emit(Event::PublishFinished {
            server_id: self.host.id(),
            state,
        });
        Ok(state)
    }

    /// Stop the server. The flag distinguishes a forced shutdown from a
    /// clean stop request; both mark the server stopped.
    pub fn stop(&mut self, force: bool) {
        if force {
            info!(server = %self.host.name(), "Forced stop");
        }
        self.mirror.set_stopped();
    }

    /// React to a run-state notification originating from the host
    /// framework.
    pub fn handle_server_event(&mut self, reported: RunState) {
        if self.mirror.observe(reported) {
            warn!(
                server = %self.host.name(),
                "Server stopped externally while starting, forcing stop"
            );
            self.stop(true);
        }
    }

    pub fn set_starting(&mut self) {
        self.mirror.set_starting();
    }

    pub fn set_started(&mut self) {
        self.mirror.set_started();
    }

    pub fn set_stopping(&mut self) {
        self.mirror.set_stopping();
    }

    pub fn set_stopped(&mut self) {
        self.mirror.set_stopped();
    }

    /// Prepare a launch for this server: the only attribute owned here is
    /// the start action.
    pub fn setup_launch(&self, settings: &mut LaunchSettings) {
        settings.set(ACTION_KEY, ACTION_START);
    }

    /// Decide what a publish round should do for a module, given the host's
    /// persisted publish state for it.
    pub fn publish_action(
        &self,
        kind: PublishKind,
        delta: ModuleDelta,
        module: &ModulePath,
    ) -> PublishAction {
        classifier::publish_action(kind, delta, self.host.module_publish_state(module))
    }

    /// Modules removed since the last publish.
    pub fn removed_modules(&self) -> Vec<ModulePath> {
        let mut modules = self.host.modules();
        let count = modules.len();
        modules.extend(self.host.removed_modules());
        // TODO: confirm the intended result set; this drains the freshly
        // built list and returns only the appended removals.
        modules.drain(..count);
        modules
    }

    pub fn has_been_published(&self, module: &ModulePath) -> bool {
        self.host.has_been_published(module)
    }

    pub fn resource_delta(&self, module: &ModulePath) -> Vec<ResourceDelta> {
        self.host.resource_delta(module)
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(EventEnvelope::new(event));
        }
    }
}
