//! Launch configuration attributes.
//!
//! Stand-in for the host framework's launch-configuration working copy.
//! The behavior only sets the action attribute; launch execution itself is
//! owned by the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Attribute key naming the action a launch should perform.
pub const ACTION_KEY: &str = "action";
/// Action value requesting a server start.
pub const ACTION_START: &str = "start";

/// Mutable attribute set for a pending launch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchSettings {
    attributes: HashMap<String, String>,
}

impl LaunchSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut settings = LaunchSettings::new();
        settings.set(ACTION_KEY, ACTION_START);

        assert_eq!(settings.get(ACTION_KEY), Some("start"));
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut settings = LaunchSettings::new();
        settings.set("mode", "debug");
        settings.set("mode", "run");
        assert_eq!(settings.get("mode"), Some("run"));
        assert_eq!(settings.attributes().len(), 1);
    }
}
