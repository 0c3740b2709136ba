//! API error type and failure taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! The client never navigates. It reports what went wrong and leaves the
//! reaction (login redirect, error page, inline message) to the caller;
//! [`crate::router::redirect_for`] holds the standard policy.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by [`super::api::ApiClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The base URL or a path could not form a request URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// A request body or query could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// The request never produced a response (connect, timeout, I/O).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Status { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The session ended while the request was in flight.
    #[error("request cancelled: session ended")]
    Cancelled,
}

/// Coarse classification driving the global failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 401: the session is no longer valid.
    Unauthenticated,
    /// 403: authenticated but not allowed.
    Forbidden,
    /// 500, 502, or 503.
    Server(u16),
    /// Validation errors, not-found, network failures, and the rest. Left
    /// to the caller.
    Other,
}

impl ApiError {
    /// HTTP status, when the server responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-reported `error` message, when the body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Location the standard failure policy sends the user to from `from`.
    #[must_use]
    pub fn redirect(&self, from: &str) -> Option<String> {
        crate::router::redirect_for(self, from)
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self.status() {
            Some(401) => FailureKind::Unauthenticated,
            Some(403) => FailureKind::Forbidden,
            Some(status @ (500 | 502 | 503)) => FailureKind::Server(status),
            _ => FailureKind::Other,
        }
    }
}
