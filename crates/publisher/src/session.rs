//! The per-round publish session.
//!
//! A session owns the bound publish method and the scratch data the method
//! carries across the start / per-module / finish sequence. It is created
//! by `publish_start` and dropped by `publish_finish`; the scratch map
//! never outlives the round.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use wharf_core::{ModuleDelta, ModulePath, PublishKind, PublishState};

use crate::error::Result;
use crate::host::HostServer;
use crate::methods::{MethodContext, PublishMethod};

pub struct PublishSession {
    method: Box<dyn PublishMethod>,
    data: HashMap<String, Value>,
}

impl PublishSession {
    pub fn new(method: Box<dyn PublishMethod>) -> Self {
        Self {
            method,
            data: HashMap::new(),
        }
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub async fn start(&mut self, host: &dyn HostServer, deploy_root: &Path) -> Result<()> {
        let Self { method, data } = self;
        let mut ctx = MethodContext::new(host, deploy_root, data);
        method.start(&mut ctx).await
    }

    pub async fn publish_module(
        &mut self,
        host: &dyn HostServer,
        deploy_root: &Path,
        kind: PublishKind,
        delta: ModuleDelta,
        module: &ModulePath,
    ) -> Result<PublishState> {
        let Self { method, data } = self;
        let mut ctx = MethodContext::new(host, deploy_root, data);
        method.publish_module(&mut ctx, kind, delta, module).await
    }

    pub async fn finish(&mut self, host: &dyn HostServer, deploy_root: &Path) -> Result<PublishState> {
        let Self { method, data } = self;
        let mut ctx = MethodContext::new(host, deploy_root, data);
        method.finish(&mut ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::LocalMethod;
    use serde_json::json;

    #[test]
    fn test_scratch_data() {
        let mut session = PublishSession::new(Box::new(LocalMethod::new()));
        assert!(session.data("marker").is_none());

        session.set_data("marker", json!({"round": 1}));
        assert_eq!(session.data("marker"), Some(&json!({"round": 1})));

        session.set_data("marker", json!(2));
        assert_eq!(session.data("marker"), Some(&json!(2)));
    }

    #[test]
    fn test_method_name() {
        let session = PublishSession::new(Box::new(LocalMethod::new()));
        assert_eq!(session.method_name(), "local");
    }
}
