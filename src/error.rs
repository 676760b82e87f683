//! Error types for the query client.
//!
//! The taxonomy follows how each failure is allowed to affect a streaming
//! session:
//! - [`ClientError`] - transport/status failures, always terminal.
//! - [`SessionError`] - what a session reports through its error callback:
//!   either a transport failure or an explicit error frame from the service.
//! - [`ParseFailure`] - a single malformed stream frame; logged and skipped,
//!   never surfaced to the caller.
//! - [`CoercionError`] - a malformed result payload; previously accumulated
//!   rows are kept and the session continues.

use thiserror::Error;

/// HTTP-level errors from the query service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed mid-stream.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    ///
    /// `message` carries the most specific detail available: the JSON
    /// `detail` field from the response body when present, otherwise the
    /// HTTP status text.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Terminal error reported through a session's error callback.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport failed before or during the stream.
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// The service sent an explicit error frame; the message is verbatim.
    #[error("service error: {0}")]
    Service(String),
}

/// A single stream frame that could not be parsed as JSON.
///
/// Recovered internally: the session logs it and keeps reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed stream frame: {message}")]
pub struct ParseFailure {
    pub message: String,
}

/// A result payload that could not be coerced into rows.
///
/// Recovered internally: the session keeps its previous rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce result payload: {message}")]
pub struct CoercionError {
    pub message: String,
}
