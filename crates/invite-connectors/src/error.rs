//! Error types for service clients

use thiserror::Error;

/// Result type for service client operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by the key-vault, registry and identity clients
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether repeating the call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport(_) | ServiceError::Timeout(_) => true,
            ServiceError::Status { status, .. } => *status >= 500 || *status == 429,
            ServiceError::NotFound(_) | ServiceError::Decode(_) => false,
        }
    }

    /// Whether the service reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(err.to_string())
        } else if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err.to_string())
    }
}
