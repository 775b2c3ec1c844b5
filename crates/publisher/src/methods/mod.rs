//! Publish method seam.
//!
//! A publish method is the pluggable transfer mechanism bound to one
//! publish round: signalled once at start, once per module, and once at
//! finish. Method types are registered in a [`MethodRegistry`] and looked
//! up by the id configured in the deployment preferences.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use wharf_core::{ModuleDelta, ModulePath, PublishKind, PublishState};

use crate::error::{PublishError, Result};
use crate::host::HostServer;

mod local;

pub use local::{LocalMethod, LocalMethodType, LOCAL_METHOD_ID};

/// What a method sees while handling one callback: the host, the deploy
/// root, and the session-scoped scratch data.
pub struct MethodContext<'a> {
    host: &'a dyn HostServer,
    deploy_root: &'a Path,
    data: &'a mut HashMap<String, Value>,
}

impl<'a> MethodContext<'a> {
    pub fn new(
        host: &'a dyn HostServer,
        deploy_root: &'a Path,
        data: &'a mut HashMap<String, Value>,
    ) -> Self {
        Self {
            host,
            deploy_root,
            data,
        }
    }

    pub fn host(&self) -> &dyn HostServer {
        self.host
    }

    pub fn deploy_root(&self) -> &Path {
        self.deploy_root
    }

    /// Stash a value for a later callback in the same round.
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// The transfer mechanism for one publish round.
#[async_trait]
pub trait PublishMethod: Send + Sync {
    /// Stable method name, used for logging and events.
    fn name(&self) -> &'static str;

    /// Called once when the round starts, before any module work.
    async fn start(&self, ctx: &mut MethodContext<'_>) -> Result<()>;

    /// Publish one module and report its resulting publish state.
    async fn publish_module(
        &self,
        ctx: &mut MethodContext<'_>,
        kind: PublishKind,
        delta: ModuleDelta,
        module: &ModulePath,
    ) -> Result<PublishState>;

    /// Called once when the round ends; the returned state is recorded as
    /// the server-level publish state.
    async fn finish(&self, ctx: &mut MethodContext<'_>) -> Result<PublishState>;
}

/// Factory for a registered publish method type.
pub trait PublishMethodType: Send + Sync {
    fn id(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn create(&self) -> Box<dyn PublishMethod>;
}

/// Registry of publish method types, keyed by id.
pub struct MethodRegistry {
    types: HashMap<&'static str, Arc<dyn PublishMethodType>>,
}

impl MethodRegistry {
    /// An empty registry with no method types.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// A registry pre-seeded with the built-in local method.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LocalMethodType));
        registry
    }

    pub fn register(&mut self, method_type: Arc<dyn PublishMethodType>) {
        self.types.insert(method_type.id(), method_type);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PublishMethodType>> {
        self.types.get(id).cloned()
    }

    /// Instantiate the method registered under `id`.
    pub fn create(&self, id: &str) -> Result<Box<dyn PublishMethod>> {
        self.types
            .get(id)
            .map(|ty| ty.create())
            .ok_or_else(|| PublishError::UnknownMethod(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.types.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
