//! Error types for collaborator calls and session operations.

use std::fmt;

use serde_json::Value;

use crate::store::Operation;

/// Message used when a failure carries no server-supplied `msg`.
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// Error category for a failed transport or upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// Could not reach the server.
    Connect,
    /// Request timed out.
    Timeout,
    /// Server answered with a non-success status.
    HttpStatus,
    /// Response body could not be decoded.
    Decode,
    /// File upload failed.
    Upload,
}

/// Failure reported by the transport or upload collaborator.
#[derive(Debug, Clone)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// `msg` field from the server's error body, if any.
    pub server_msg: Option<String>,
    /// Free-form details for logs (never shown to users as-is).
    pub details: Option<String>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            server_msg: None,
            details: Some(details.into()),
        }
    }

    /// Builds an HTTP status error, pulling `msg` out of a JSON body.
    pub fn http_status(status: u16, body: &str) -> Self {
        let server_msg = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("msg").and_then(Value::as_str).map(str::to_string))
            .filter(|msg| !msg.is_empty());
        Self {
            kind: RequestErrorKind::HttpStatus,
            status: Some(status),
            server_msg,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Server-supplied message, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        self.server_msg.as_deref()
    }

    /// Message a user should see: the server's, or the fallback.
    pub fn user_message(&self) -> &str {
        self.server_message().unwrap_or(FALLBACK_MESSAGE)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.server_message()) {
            (Some(status), Some(msg)) => write!(f, "HTTP {status}: {msg}"),
            (Some(status), None) => write!(f, "HTTP {status}"),
            (None, _) => match &self.details {
                Some(details) => write!(f, "{:?}: {details}", self.kind),
                None => write!(f, "{:?}", self.kind),
            },
        }
    }
}

impl std::error::Error for RequestError {}

/// Failure of a session operation, carrying the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub operation: Operation,
    pub message: String,
}

impl OperationError {
    pub fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Applies the fallback rule to a collaborator failure.
    pub fn from_request(operation: Operation, err: &RequestError) -> Self {
        Self::new(operation, err.user_message())
    }

    /// Failure with no server message.
    pub fn fallback(operation: Operation) -> Self {
        Self::new(operation, FALLBACK_MESSAGE)
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OperationError {}
