//! Event types for the wharf notification system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wharf_core::{ModulePath, PublishState, RunState};

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The host framework changed the server run state
    #[serde(rename = "server.state_changed")]
    ServerStateChanged { server_id: Uuid, state: RunState },

    /// A publish round started
    #[serde(rename = "publish.started")]
    PublishStarted { server_id: Uuid, method: String },

    /// A module publish attempt completed
    #[serde(rename = "publish.module")]
    ModulePublished {
        server_id: Uuid,
        module: ModulePath,
        state: PublishState,
        success: bool,
    },

    /// A publish round finished
    #[serde(rename = "publish.finished")]
    PublishFinished {
        server_id: Uuid,
        state: PublishState,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the server ID associated with this event, if any
    pub fn server_id(&self) -> Option<Uuid> {
        match self {
            Event::ServerStateChanged { server_id, .. } => Some(*server_id),
            Event::PublishStarted { server_id, .. } => Some(*server_id),
            Event::ModulePublished { server_id, .. } => Some(*server_id),
            Event::PublishFinished { server_id, .. } => Some(*server_id),
            Event::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_creation() {
        let event = Event::PublishStarted {
            server_id: Uuid::new_v4(),
            method: "local".to_string(),
        };
        let envelope = EventEnvelope::new(event);

        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::ServerStateChanged {
            server_id: Uuid::new_v4(),
            state: RunState::Stopped,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("server.state_changed"));
        assert!(json.contains("stopped"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"publish.finished","server_id":"550e8400-e29b-41d4-a716-446655440000","state":"synced"}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match event {
            Event::PublishFinished { server_id, state } => {
                assert_eq!(state, PublishState::Synced);
                assert!(!server_id.is_nil());
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_event_server_id() {
        let server_id = Uuid::new_v4();

        let event = Event::ModulePublished {
            server_id,
            module: ModulePath::root("webapp"),
            state: PublishState::Synced,
            success: true,
        };
        assert_eq!(event.server_id(), Some(server_id));

        let error_event = Event::Error {
            message: "boom".to_string(),
            context: None,
        };
        assert_eq!(error_event.server_id(), None);
    }
}
