//! Supervisor and collaborator errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while supervising the external process
///
/// None of these are fatal: every variant leaves the supervisor idle and
/// ready for a retry.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Required directory or file absent
    #[error("Missing resources: {}", .missing.join(", "))]
    MissingResource {
        /// Names of the missing resources
        missing: Vec<String>,
    },

    /// Process failed to start or exited during the liveness probe
    #[error("Spawn failure: {reason}")]
    SpawnFailure {
        /// What went wrong
        reason: String,
        /// Captured standard error, empty if nothing was written
        stderr: String,
    },

    /// OS status query failed
    #[error("Status probe failed: {0}")]
    Probe(String),

    /// Service-control script not found
    #[error("Service script not found: {}", .0.display())]
    CollaboratorUnavailable(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supervisor result type
pub type Result<T> = std::result::Result<T, SupervisorError>;

impl SupervisorError {
    /// Create a spawn failure without captured output
    pub fn spawn(reason: impl Into<String>) -> Self {
        Self::SpawnFailure {
            reason: reason.into(),
            stderr: String::new(),
        }
    }

    /// Short text suitable for a notification
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingResource { missing } => format!("Error: missing files: {}", missing.join(", ")),
            Self::SpawnFailure { .. } => "Launch error: check the logs".to_string(),
            Self::Probe(_) => "Status check failed".to_string(),
            Self::CollaboratorUnavailable(path) => format!("{} not found!", path.display()),
            Self::Io(e) => format!("Launch error: {e}"),
        }
    }
}

impl From<zapret_core::Error> for SupervisorError {
    fn from(err: zapret_core::Error) -> Self {
        match err {
            zapret_core::Error::MissingResource { missing } => Self::MissingResource { missing },
            zapret_core::Error::Io(e) => Self::Io(e),
            other => Self::spawn(other.to_string()),
        }
    }
}

/// Notification delivery failure; always logged and swallowed by callers
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Receiving side is gone
    #[error("Notification channel disconnected")]
    Disconnected,

    /// Backend-specific failure
    #[error("Notification backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resource_conversion() {
        let err: SupervisorError = zapret_core::Error::missing(["list-x.txt"]).into();
        match err {
            SupervisorError::MissingResource { ref missing } => assert_eq!(missing, &["list-x.txt"]),
            _ => panic!("Wrong error type"),
        }
        assert!(err.user_message().contains("list-x.txt"));
    }

    #[test]
    fn test_spawn_failure_display() {
        let err = SupervisorError::SpawnFailure {
            reason: "exited with code 1".into(),
            stderr: "bad filter".into(),
        };
        assert_eq!(err.to_string(), "Spawn failure: exited with code 1");
        assert_eq!(err.user_message(), "Launch error: check the logs");
    }
}
