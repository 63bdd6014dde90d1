//! Error types for the todo API client and cache.
//!
//! # Design
//! The taxonomy is deliberately small: callers branch on the kind of failure
//! (retry a network error, show a validation message, drop a missing row),
//! not on raw status codes. `ServerFault` keeps the status and body for
//! debugging. `Busy` and `StaleResponse` come from the cache, never from HTTP.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the remote store and the collection cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, DNS, timeout).
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The server rejected the request with a 4xx other than 404.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server returned 404, the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a 5xx.
    #[error("server fault (HTTP {status}): {body}")]
    ServerFault { status: u16, body: String },

    /// Anything else: unexpected status, undecodable body, unserializable input.
    #[error("unexpected response: {0}")]
    Unknown(String),

    /// A reorder is already in flight.
    #[error("another reorder is still in flight")]
    Busy,

    /// A response arrived after a newer one was applied. Internal to the cache.
    #[error("response superseded by a newer collection generation")]
    StaleResponse,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => ApiError::NotFound,
            400..=499 => ApiError::InvalidArgument(validation_message(status, body)),
            500..=599 => ApiError::ServerFault {
                status,
                body: body.to_string(),
            },
            _ => ApiError::Unknown(format!("unexpected HTTP {status}")),
        }
    }
}

/// Prefer the server's `{"error": "..."}` message, then the raw body.
fn validation_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}
