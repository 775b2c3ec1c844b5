//! The built-in local-transfer publish method.
//!
//! Deploys module content by filesystem copy under the deploy root. A full
//! publish replaces the deployed tree, an incremental publish applies the
//! host-reported resource deltas, a remove publish deletes the tree.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use wharf_core::{CoreError, ModuleDelta, ModulePath, PublishAction, PublishKind, PublishState};

use crate::classifier::publish_action;
use crate::error::Result;
use crate::methods::{MethodContext, PublishMethod, PublishMethodType};

pub const LOCAL_METHOD_ID: &str = "local";

/// Scratch key tracking files copied across the round.
const FILES_COPIED_KEY: &str = "local.files_copied";

pub struct LocalMethodType;

impl PublishMethodType for LocalMethodType {
    fn id(&self) -> &'static str {
        LOCAL_METHOD_ID
    }

    fn label(&self) -> &'static str {
        "Local filesystem"
    }

    fn create(&self) -> Box<dyn PublishMethod> {
        Box::new(LocalMethod::new())
    }
}

#[derive(Default)]
pub struct LocalMethod;

impl LocalMethod {
    pub fn new() -> Self {
        Self
    }

    fn module_root(ctx: &MethodContext<'_>, module: &ModulePath) -> Result<PathBuf> {
        ctx.host()
            .module_root(module)
            .ok_or_else(|| CoreError::ModuleNotFound(module.to_string()).into())
    }

    fn bump_copied(ctx: &mut MethodContext<'_>, count: u64) {
        let total = ctx
            .data(FILES_COPIED_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        ctx.set_data(FILES_COPIED_KEY, Value::from(total + count));
    }

    async fn publish_full(
        ctx: &mut MethodContext<'_>,
        module: &ModulePath,
        target: &Path,
    ) -> Result<PublishState> {
        let root = Self::module_root(ctx, module)?;
        if fs::try_exists(target).await? {
            fs::remove_dir_all(target).await?;
        }
        let copied = copy_tree(&root, target).await?;
        debug!(module = %module, files = copied, "Full publish complete");
        Self::bump_copied(ctx, copied);
        Ok(PublishState::Synced)
    }

    async fn publish_incremental(
        ctx: &mut MethodContext<'_>,
        module: &ModulePath,
        target: &Path,
    ) -> Result<PublishState> {
        let root = Self::module_root(ctx, module)?;
        let deltas = ctx.host().resource_delta(module);
        let mut copied = 0;

        for delta in &deltas {
            let deployed = target.join(&delta.path);
            match delta.kind {
                ModuleDelta::Removed => {
                    if fs::try_exists(&deployed).await? {
                        fs::remove_file(&deployed).await?;
                    }
                }
                ModuleDelta::Added | ModuleDelta::Changed => {
                    if let Some(parent) = deployed.parent() {
                        fs::create_dir_all(parent).await?;
                    }
                    fs::copy(root.join(&delta.path), &deployed).await?;
                    copied += 1;
                }
                ModuleDelta::NoChange => {}
            }
        }

        debug!(module = %module, files = copied, "Incremental publish complete");
        Self::bump_copied(ctx, copied);
        Ok(PublishState::Synced)
    }

    async fn publish_remove(module: &ModulePath, target: &Path) -> Result<PublishState> {
        if fs::try_exists(target).await? {
            fs::remove_dir_all(target).await?;
        }
        debug!(module = %module, "Removed deployed content");
        Ok(PublishState::Synced)
    }
}

#[async_trait]
impl PublishMethod for LocalMethod {
    fn name(&self) -> &'static str {
        LOCAL_METHOD_ID
    }

    async fn start(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        fs::create_dir_all(ctx.deploy_root()).await?;
        ctx.set_data(FILES_COPIED_KEY, Value::from(0u64));
        debug!(deploy_root = %ctx.deploy_root().display(), "Local publish round starting");
        Ok(())
    }

    async fn publish_module(
        &self,
        ctx: &mut MethodContext<'_>,
        kind: PublishKind,
        delta: ModuleDelta,
        module: &ModulePath,
    ) -> Result<PublishState> {
        let current = ctx.host().module_publish_state(module);
        let action = publish_action(kind, delta, current);
        let target = ctx.deploy_root().join(module.as_rel_path());

        match action {
            PublishAction::None => Ok(current),
            PublishAction::Full => Self::publish_full(ctx, module, &target).await,
            PublishAction::Incremental => Self::publish_incremental(ctx, module, &target).await,
            PublishAction::Remove => Self::publish_remove(module, &target).await,
        }
    }

    async fn finish(&self, ctx: &mut MethodContext<'_>) -> Result<PublishState> {
        let copied = ctx
            .data(FILES_COPIED_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        info!(files = copied, "Local publish round finished");
        Ok(PublishState::Synced)
    }
}

/// Copy a directory tree, returning the number of files copied.
async fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    let mut copied = 0;
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to).await?;
        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target).await?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
