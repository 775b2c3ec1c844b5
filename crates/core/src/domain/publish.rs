use serde::{Deserialize, Serialize};

/// The kind of publish round requested by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishKind {
    #[default]
    Incremental,
    Full,
    /// Automatic publish triggered by a resource change.
    Auto,
    /// Full publish preceded by a clean of previously deployed content.
    Clean,
}

impl PublishKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
            Self::Auto => "auto",
            Self::Clean => "clean",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "incremental" => Some(Self::Incremental),
            "full" => Some(Self::Full),
            "auto" => Some(Self::Auto),
            "clean" => Some(Self::Clean),
            _ => None,
        }
    }
}

/// Persisted publish state for a module (or the server as a whole): what
/// kind of publish is still outstanding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    /// Deployed content matches the workspace.
    #[default]
    Synced,
    NeedsIncremental,
    NeedsFull,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::NeedsIncremental => "needs_incremental",
            Self::NeedsFull => "needs_full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "synced" => Some(Self::Synced),
            "needs_incremental" => Some(Self::NeedsIncremental),
            "needs_full" => Some(Self::NeedsFull),
            _ => None,
        }
    }
}

/// The action a publish round should take for one module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishAction {
    None,
    Incremental,
    Full,
    Remove,
}

impl PublishAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Incremental => "incremental",
            Self::Full => "full",
            Self::Remove => "remove",
        }
    }
}
