//! JSON serialization for the Taskboard wire protocol.
//!
//! Every request and response body is JSON. Error responses carry an
//! optional human-readable `message` which the client prefers over its own
//! generic wording.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A timestamp string was neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
    /// A priority string did not name a known priority.
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    /// A task record carried neither `id` nor `_id`.
    #[error("task record has no id")]
    MissingTaskId,
}

/// Body returned by the API alongside a non-success status code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Server-provided description of the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Creates an error body carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Encodes a payload as a JSON byte vector.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a payload from JSON bytes.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes are not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Extracts the server message from an error response body, if any.
///
/// Bodies that are empty, not JSON, or lack a non-blank `message` yield `None`.
#[must_use]
pub fn error_message(bytes: &[u8]) -> Option<String> {
    decode::<ErrorBody>(bytes)
        .ok()?
        .message
        .filter(|m| !m.trim().is_empty())
}
