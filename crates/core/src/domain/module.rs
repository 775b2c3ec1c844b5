use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identity of a deployable module: the chain of module names from the
/// root deployable down to the module itself (e.g. an ear containing a war).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// A top-level module with no parent chain.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Extend the chain with a nested module.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Parse a `/`-separated chain. Empty input or empty segments are
    /// rejected.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::InvalidModulePath(s.to_string()));
        }
        let segments: Vec<String> = s.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CoreError::InvalidModulePath(s.to_string()));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The innermost module name.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Relative filesystem path mirroring the module chain.
    pub fn as_rel_path(&self) -> PathBuf {
        self.0.iter().collect()
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// What changed for a module (or a resource inside one) between publish
/// rounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleDelta {
    #[default]
    NoChange,
    Added,
    Changed,
    Removed,
}

impl ModuleDelta {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoChange => "no_change",
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_change" => Some(Self::NoChange),
            "added" => Some(Self::Added),
            "changed" => Some(Self::Changed),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// A single changed resource inside a module, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub path: PathBuf,
    pub kind: ModuleDelta,
}

impl ResourceDelta {
    pub fn new(path: impl Into<PathBuf>, kind: ModuleDelta) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_display() {
        let path = ModulePath::root("site").child("webapp");
        assert_eq!(path.to_string(), "site/webapp");
        assert_eq!(path.leaf(), Some("webapp"));
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_module_path_parse() {
        let path = ModulePath::parse("ear/inner-war").unwrap();
        assert_eq!(path.segments(), ["ear", "inner-war"]);

        assert!(ModulePath::parse("").is_err());
        assert!(ModulePath::parse("a//b").is_err());
    }

    #[test]
    fn test_module_path_as_rel_path() {
        let path = ModulePath::root("site").child("webapp");
        assert_eq!(path.as_rel_path(), PathBuf::from("site/webapp"));
    }

    #[test]
    fn test_module_delta_round_trip() {
        assert_eq!(ModuleDelta::Added.as_str(), "added");
        assert_eq!(ModuleDelta::parse("removed"), Some(ModuleDelta::Removed));
        assert_eq!(ModuleDelta::parse("bogus"), None);
    }

    #[test]
    fn test_resource_delta_serialization() {
        let delta = ResourceDelta::new("web/index.html", ModuleDelta::Changed);
        let json = serde_json::to_string(&delta).unwrap();
        assert!(json.contains("changed"));
        assert!(json.contains("index.html"));
    }
}
