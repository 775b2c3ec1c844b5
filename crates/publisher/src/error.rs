use thiserror::Error;
use wharf_core::CoreError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish already in progress")]
    AlreadyPublishing,

    #[error("Not currently publishing")]
    NotPublishing,

    #[error("No publish method registered for id: {0}")]
    UnknownMethod(String),

    #[error("Publish method {method} failed for module {module}: {reason}")]
    MethodFailed {
        method: String,
        module: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Severity marker carried by every error surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl PublishError {
    /// Create a method failure for a specific module.
    pub fn method_failed(
        method: impl Into<String>,
        module: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::MethodFailed {
            method: method.into(),
            module: module.to_string(),
            reason: reason.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::AlreadyPublishing
            | Self::NotPublishing
            | Self::UnknownMethod(_)
            | Self::MethodFailed { .. }
            | Self::Core(_)
            | Self::Io(_)
            | Self::Serialization(_) => Severity::Error,
        }
    }

    /// Whether the error is a lifecycle protocol violation rather than a
    /// failure of the publish work itself.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::AlreadyPublishing | Self::NotPublishing)
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PublishError::method_failed("local", "site/webapp", "disk full");
        let text = error.to_string();
        assert!(text.contains("local"));
        assert!(text.contains("site/webapp"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_severity() {
        assert_eq!(PublishError::AlreadyPublishing.severity(), Severity::Error);
        assert_eq!(
            PublishError::UnknownMethod("rsync".to_string()).severity(),
            Severity::Error
        );
        assert_eq!(Severity::Warning.as_str(), "warning");
    }

    #[test]
    fn test_protocol_violation() {
        assert!(PublishError::AlreadyPublishing.is_protocol_violation());
        assert!(PublishError::NotPublishing.is_protocol_violation());
        assert!(!PublishError::UnknownMethod("x".to_string()).is_protocol_violation());
    }
}
