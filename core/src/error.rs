//! Error types for the Todoist client.
//!
//! # Design
//! Callers mostly care about *why* a call failed: bad credentials, a missing
//! project or task, an argument the service rejected, or a network problem.
//! Each of those gets its own variant carrying the remote status code and
//! message when the service supplied them. Any other non-2xx response lands
//! in `Http`.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad credentials, an invalid token, or a session that was logged out.
    #[error("authentication failed: {message}")]
    Authentication { status: Option<u16>, message: String },

    /// The referenced project, task or other resource does not exist.
    #[error("not found: {message}")]
    NotFound { status: Option<u16>, message: String },

    /// Malformed arguments, rejected either locally or by the service.
    #[error("invalid request: {message}")]
    Validation { status: Option<u16>, message: String },

    /// Network-level failure: DNS, connect, timeout, reset.
    #[error("transport error: {0}")]
    Transport(String),

    /// A non-2xx status with no more specific meaning.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request arguments could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A local file given for upload could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error body returned by the v8 endpoints, e.g.
/// `{"error_tag":"LOGIN_ERROR","error_code":100,"http_code":401,"error":"Login failed"}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl Error {
    /// Map a failed HTTP response onto the error taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(status, body);
        match status {
            401 | 403 => Error::Authentication {
                status: Some(status),
                message,
            },
            404 => Error::NotFound {
                status: Some(status),
                message,
            },
            400 | 422 => Error::Validation {
                status: Some(status),
                message,
            },
            _ => Error::Http { status, message },
        }
    }

    /// Map a failed sync command onto the error taxonomy. Commands fail inside
    /// a 200 response, so the status comes from the command's `http_code`.
    pub(crate) fn from_command(http_code: Option<u16>, message: String) -> Self {
        match http_code {
            Some(status @ (401 | 403)) => Error::Authentication {
                status: Some(status),
                message,
            },
            Some(404) => Error::NotFound {
                status: Some(404),
                message,
            },
            status => Error::Validation { status, message },
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::Validation {
            status: None,
            message: message.into(),
        }
    }

    pub(crate) fn logged_out() -> Self {
        Error::Authentication {
            status: None,
            message: "session is no longer active".to_string(),
        }
    }

    /// Remote status code, when the failure came from the service.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. }
            | Error::NotFound { status, .. }
            | Error::Validation { status, .. } => *status,
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

fn error_message(status: u16, body: &str) -> String {
    if let Ok(ErrorBody { error: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        format!("status {status}")
    } else {
        body.to_string()
    }
}
