//! Access to the Remote Task Store.
//!
//! Defines the [`TaskStore`] trait every backend must satisfy.
//! Implementations:
//! - [`http::HttpTaskStore`]: the real HTTP API
//! - [`memory::MemoryTaskStore`]: in-process store with fault injection, for tests

pub mod http;
pub mod memory;

use taskboard_proto::auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use taskboard_proto::codec;
use taskboard_proto::listing::Listing;
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskStatus};

use crate::session::Credential;

/// Errors reported by a [`TaskStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The credential is missing, invalid or expired (401/403).
    #[error("not authorized (HTTP {status})")]
    Unauthorized {
        /// 401 or 403.
        status: u16,
        /// Message from the error body, if any.
        message: Option<String>,
    },

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The server failed (5xx).
    #[error("server error (HTTP {status})")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: Option<String>,
    },

    /// The server refused the request for a reason other than auth (4xx).
    #[error("request rejected (HTTP {status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: Option<String>,
    },

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classifies a non-success HTTP response.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = codec::error_message(body);
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Rejected { status, message },
        }
    }

    /// Whether this failure must end the session.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. }
            | Self::Server { message, .. }
            | Self::Rejected { message, .. } => message.as_deref(),
            Self::Timeout | Self::Network(_) | Self::Decode(_) => None,
        }
    }
}

/// Async access to the task API.
///
/// Write operations return the record the server echoed back when the
/// response body holds one; callers must not rely on it and refresh the
/// list instead.
pub trait TaskStore: Send + Sync {
    /// Exchanges credentials for a bearer token.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl std::future::Future<Output = Result<LoginResponse, StoreError>> + Send;

    /// Creates an account.
    fn signup(
        &self,
        request: &SignupRequest,
    ) -> impl std::future::Future<Output = Result<SignupResponse, StoreError>> + Send;

    /// Fetches every task visible to `credential`.
    fn list_tasks(
        &self,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<Listing, StoreError>> + Send;

    /// Creates a task.
    fn create_task(
        &self,
        credential: &Credential,
        draft: &TaskDraft,
    ) -> impl std::future::Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Replaces a task with `task`.
    fn update_task(
        &self,
        credential: &Credential,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Sets a task's status.
    fn update_status(
        &self,
        credential: &Credential,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl std::future::Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Deletes a task.
    fn delete_task(
        &self,
        credential: &Credential,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
