//! Error types for chatgpt-bridge.

use std::fmt;

use thiserror::Error;

/// A non-2xx response from the upstream service.
///
/// The body is kept verbatim and never parsed further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    /// HTTP status code.
    pub code: u16,
    /// Canonical status line, e.g. `403 Forbidden`.
    pub status_text: String,
    /// Raw response body.
    pub body: String,
}

impl StatusError {
    /// Build from a status code and a body, deriving the status text.
    pub fn new(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            status_text: status.to_string(),
            body: body.into(),
        }
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode: {}\n{}", self.status_text, self.body)
    }
}

impl std::error::Error for StatusError {}

/// The main error type for chatgpt-bridge.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ────────────────────────────────────────────────────────────
    /// Connection, DNS, TLS or body read failure. No HTTP status exists.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("{0}")]
    Status(#[from] StatusError),

    // ── Decoding ─────────────────────────────────────────────────────────────
    /// A line that had to carry a payload was not valid JSON.
    #[error("Decode error: {source} (line: {line})")]
    Decode {
        /// The offending payload text.
        line: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The body did not contain a usable payload line.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// Request serialization or session body parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Caller side ──────────────────────────────────────────────────────────
    /// Rejected before any network I/O.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A response tried to move a conversation to a different id.
    #[error("Conversation id changed from {expected} to {actual}")]
    ConversationMismatch {
        /// The id already recorded for the thread.
        expected: String,
        /// The id carried by the new response.
        actual: String,
    },

    /// Raised by a frame sink to abort a stream.
    #[error("Aborted: {0}")]
    Aborted(String),

    // ── Infrastructure ───────────────────────────────────────────────────────
    /// Clearance store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The upstream HTTP status, when this error carries one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status(status) => Some(status.code),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the caller has to obtain fresh credentials.
    ///
    /// An expired clearance pair is indistinguishable from an expired session.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, Error>;
