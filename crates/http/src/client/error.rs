//! Client error types

use crate::session::store::StorageError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No response within the allotted time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The access token could not be refreshed; the session has ended
    #[error("Session refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// An authenticated call was made without a stored session
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the server rejected the credentials with a 401
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Whether this error ended the session
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::RefreshFailed(_) | Self::NotAuthenticated)
    }
}

/// Why a token refresh failed.
///
/// Cloned into every request that was waiting on the refresh, so it carries
/// only owned, cloneable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    /// Status returned by the refresh endpoint, if it answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn from_error(error: &ClientError) -> Self {
        let status = match error {
            ClientError::ServerError { status, .. } => Some(*status),
            ClientError::AuthenticationFailed(_) => Some(401),
            ClientError::BadRequest(_) => Some(400),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            ClientError::RefreshFailed(failure) => failure.status,
            _ => None,
        };
        Self::new(status, error.to_string())
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}
