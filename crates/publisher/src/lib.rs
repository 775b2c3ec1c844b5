//! Publish lifecycle coordination for application-server adapters.
//!
//! The host runtime drives a [`DeployBehavior`] through serialized
//! callbacks: `publish_start`, one `publish_module` per affected module,
//! then `publish_finish`. The behavior binds one publish method for the
//! whole round, records per-module outcomes on the host, and mirrors the
//! server run state.

pub mod behavior;
pub mod classifier;
pub mod error;
pub mod host;
pub mod launch;
pub mod methods;
pub mod mirror;
pub mod prefs;
pub mod session;

pub use behavior::DeployBehavior;
pub use classifier::publish_action;
pub use error::{PublishError, Result, Severity};
pub use host::{HostServer, InMemoryServer};
pub use launch::{LaunchSettings, ACTION_KEY, ACTION_START};
pub use methods::{
    LocalMethod, LocalMethodType, MethodContext, MethodRegistry, PublishMethod,
    PublishMethodType, LOCAL_METHOD_ID,
};
pub use mirror::{watch_server_events, StateMirror};
pub use prefs::{DeploymentPreferences, ModuleEntry};
pub use session::PublishSession;
