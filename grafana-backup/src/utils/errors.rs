//! Custom error types for the backup utility.
//!
//! Failures fall into two tiers: transport errors from the Grafana API abort
//! a backup pass, while storage errors are logged at the call site and the
//! pass carries on. `is_transport` is what the orchestrator consults when
//! applying the fail-fast policy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No folder matches {0}")]
    FolderNotFound(String),

    #[error("Folder selector {selector} matches {count} folders")]
    AmbiguousFolder { selector: String, count: usize },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl BackupError {
    /// True for errors raised by the Grafana API or the HTTP layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackupError::Api { .. } | BackupError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_transport() {
        let err = BackupError::Api {
            status: 401,
            message: "Invalid username or password".to_string(),
        };
        assert!(err.is_transport());
    }

    #[test]
    fn test_storage_errors_are_not_transport() {
        let err = BackupError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(!err.is_transport());

        let err = BackupError::Config("missing folder".to_string());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_api_error_display_includes_server_message() {
        let err = BackupError::Api {
            status: 404,
            message: "Dashboard not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404: Dashboard not found");
    }
}
