use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type surfaced to the editor host.
///
/// The lower layers each carry their own precise error enums; this type is
/// the flattened form a host frontend routes to notifications and log views.
#[derive(Error, Debug)]
pub enum ChainviewError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Port {0} is occupied by an incompatible process")]
    PortConflict(u16),

    #[error("Authentication unavailable for {0}")]
    AuthUnavailable(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Error caused by user action (cancelled prompt, bad input).
    UserError,
    /// Error from a remote provider (auth, API failure).
    ProviderError,
    /// Network connectivity or port issue.
    NetworkError,
    /// Internal system error (storage, file I/O, etc.).
    SystemError,
}

impl ChainviewError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::SystemError,
            Self::PortConflict(_) => ErrorCategory::NetworkError,
            Self::AuthUnavailable(_) => ErrorCategory::ProviderError,
            Self::Cancelled => ErrorCategory::UserError,
            Self::Storage(_) => ErrorCategory::SystemError,
            Self::Network(_) => ErrorCategory::NetworkError,
            Self::Internal(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Invalid project data: {msg}"),
            Self::PortConflict(port) => {
                format!("Port {port} is already in use by another application.")
            }
            Self::AuthUnavailable(provider) => {
                format!("Sign in to {provider} to connect a project.")
            }
            Self::Cancelled => "Cancelled.".into(),
            Self::Storage(_) => "Storage error. Check disk space and permissions.".into(),
            Self::Network(_) => "Network error. Check your connection.".into(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }
}
