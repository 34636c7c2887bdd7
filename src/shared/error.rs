//! Shared Error Types
//!
//! This module defines the error types used across the client. They split into
//! two families:
//!
//! - [`ApiError`] - the outcome of a remote call that did not succeed. Its
//!   variants mirror the failure taxonomy the sync engine reacts to.
//! - [`SharedError`] - local faults (serialization, validation, storage).
//!
//! # Failure Taxonomy
//!
//! - `Transport` - the HTTP exchange never completed. Retried up to the
//!   configured budget before this error is produced.
//! - `Terminal` - a response arrived but reports failure (`success: false`
//!   or a non-2xx status). Never retried.
//! - `MalformedResponse` - a response arrived without a JSON body.
//! - `NotAuthenticated` - no bearer token is configured for a call that needs one.
//!
//! # Usage
//!
//! ```rust
//! use artline::shared::error::ApiError;
//!
//! let error = ApiError::terminal(Some(402), Some("quota exceeded".to_string()));
//! assert_eq!(error.user_message("Failed to update favorite status"), "quota exceeded");
//! ```
use thiserror::Error;

/// Notification text used when a request never completed.
pub const NETWORK_ERROR_MESSAGE: &str = "Network or parsing error";

/// Notification text used when a response body was not JSON.
pub const UNEXPECTED_FORMAT_MESSAGE: &str = "Unexpected response format";

/// Failure of a remote call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not complete an HTTP exchange
    #[error("transport failure after {attempts} attempt(s): {message}")]
    Transport {
        /// Number of attempts made before giving up
        attempts: u32,
        /// Description of the last transport error
        message: String,
    },

    /// The exchange completed but the backend reported failure
    #[error("request failed (status {status:?}): {}", message.as_deref().unwrap_or("no message"))]
    Terminal {
        /// HTTP status, when the failure came from a non-2xx response
        status: Option<u16>,
        /// Backend-supplied message, if any
        message: Option<String>,
    },

    /// The response was not JSON
    #[error("unexpected response format (content-type {content_type:?})")]
    MalformedResponse {
        /// The content type the server sent
        content_type: Option<String>,
    },

    /// No bearer token configured
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// Create a new transport error
    pub fn transport(attempts: u32, message: impl Into<String>) -> Self {
        Self::Transport {
            attempts,
            message: message.into(),
        }
    }

    /// Create a new terminal error
    pub fn terminal(status: Option<u16>, message: Option<String>) -> Self {
        Self::Terminal { status, message }
    }

    /// Create a new malformed-response error
    pub fn malformed(content_type: Option<String>) -> Self {
        Self::MalformedResponse { content_type }
    }

    /// Whether the request never completed
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status of a terminal failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Terminal { status, .. } => *status,
            _ => None,
        }
    }

    /// Text to show the user for this failure.
    ///
    /// `fallback` is used for terminal failures that carry no backend message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Transport { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Terminal { message: Some(message), .. } if !message.is_empty() => message.clone(),
            Self::Terminal { .. } => fallback.to_string(),
            Self::MalformedResponse { .. } => UNEXPECTED_FORMAT_MESSAGE.to_string(),
            Self::NotAuthenticated => "Not authenticated".to_string(),
        }
    }
}

/// Local errors that do not involve the backend
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Local persistence error
    #[error("Storage error for key '{key}': {message}")]
    StorageError {
        /// Storage key involved
        key: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageError {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Either kind of failure, for operations that validate locally before calling out
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Local(#[from] SharedError),
}
