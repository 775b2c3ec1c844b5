//! Event system for wharf
//!
//! This crate provides the event bus and event types used to notify
//! listeners of server state and publish lifecycle changes.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
