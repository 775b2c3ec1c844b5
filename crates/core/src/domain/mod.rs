mod module;
mod publish;
mod server;

pub use module::{ModuleDelta, ModulePath, ResourceDelta};
pub use publish::{PublishAction, PublishKind, PublishState};
pub use server::{RunState, ServerInfo};
