//! Decision table mapping module change information to a publish action.

use wharf_core::{ModuleDelta, PublishAction, PublishKind, PublishState};

/// Decide what a publish round should do for one module.
///
/// Evaluated in order, first match wins:
/// an added module always gets a full publish even under an otherwise
/// incremental round, and a removed module is never given incremental work.
pub fn publish_action(
    kind: PublishKind,
    delta: ModuleDelta,
    state: PublishState,
) -> PublishAction {
    if delta == ModuleDelta::Added {
        return PublishAction::Full;
    }
    if delta == ModuleDelta::Removed {
        return PublishAction::Remove;
    }
    if kind == PublishKind::Full || kind == PublishKind::Clean || state == PublishState::NeedsFull {
        return PublishAction::Full;
    }
    if (kind == PublishKind::Incremental
        || kind == PublishKind::Auto
        || state == PublishState::NeedsIncremental)
        && delta == ModuleDelta::Changed
    {
        return PublishAction::Incremental;
    }
    PublishAction::None
}
