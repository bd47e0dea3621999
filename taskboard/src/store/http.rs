//! HTTP implementation of [`TaskStore`] backed by `reqwest`.
//!
//! Every request sends and accepts JSON. Authenticated requests carry
//! `Authorization: Bearer <token>`. Non-success statuses are classified by
//! [`StoreError::from_response`]; nothing is retried.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use taskboard_proto::auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use taskboard_proto::codec;
use taskboard_proto::listing::{self, Listing};
use taskboard_proto::paths;
use taskboard_proto::task::{StatusUpdate, Task, TaskDraft, TaskId, TaskStatus};

use super::{StoreError, TaskStore};
use crate::session::Credential;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can occur while constructing an [`HttpTaskStore`].
#[derive(Debug, thiserror::Error)]
pub enum HttpStoreError {
    /// The configured base URL does not parse.
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Task store that talks to the remote API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: reqwest::Client,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl HttpTaskStore {
    /// Creates a store for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpStoreError::InvalidBaseUrl`] if `base_url` does not
    /// parse, or [`HttpStoreError::Client`] if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpStoreError> {
        let parsed = url::Url::parse(base_url).map_err(|source| HttpStoreError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
    }

    fn authed(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        self.request(method, path)
            .header(AUTHORIZATION, credential.bearer())
    }

    /// Sends a request and returns the body of a successful response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<Vec<u8>, StoreError> {
        tracing::debug!(%method, path, "sending request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed");
            transport_error(&e)
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| transport_error(&e))?;

        if (200..300).contains(&status) {
            return Ok(body.to_vec());
        }

        let err = StoreError::from_response(status, &body);
        match &err {
            StoreError::Unauthorized { .. } => {
                tracing::warn!(%method, path, status, "credential rejected");
            }
            StoreError::Server { .. } => {
                tracing::error!(%method, path, status, "server error");
            }
            _ => tracing::info!(%method, path, status, "request rejected"),
        }
        Err(err)
    }
}

/// Maps a transport-level `reqwest` failure onto the store taxonomy.
fn transport_error(e: &reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_decode() || e.is_body() {
        StoreError::Decode(e.to_string())
    } else {
        StoreError::Network(e.to_string())
    }
}

fn decode_required<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, StoreError> {
    codec::decode(body).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Write responses are informational; a body that is not a task is ignored.
fn decode_echo(body: &[u8]) -> Option<Task> {
    codec::decode(body).ok()
}

impl TaskStore for HttpTaskStore {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, StoreError> {
        let body = self
            .execute(
                self.request(Method::POST, paths::LOGIN).json(request),
                &Method::POST,
                paths::LOGIN,
            )
            .await?;
        decode_required(&body)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, StoreError> {
        let body = self
            .execute(
                self.request(Method::POST, paths::SIGNUP).json(request),
                &Method::POST,
                paths::SIGNUP,
            )
            .await?;
        if body.is_empty() {
            return Ok(SignupResponse::default());
        }
        decode_required(&body)
    }

    async fn list_tasks(&self, credential: &Credential) -> Result<Listing, StoreError> {
        let body = self
            .execute(
                self.authed(Method::GET, paths::TASKS, credential),
                &Method::GET,
                paths::TASKS,
            )
            .await?;
        let listing =
            listing::decode_listing(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        if listing.skipped > 0 {
            tracing::warn!(skipped = listing.skipped, "ignored malformed tasks in listing");
        }
        tracing::debug!(shape = ?listing.shape, count = listing.tasks.len(), "task list received");
        Ok(listing)
    }

    async fn create_task(
        &self,
        credential: &Credential,
        draft: &TaskDraft,
    ) -> Result<Option<Task>, StoreError> {
        let body = self
            .execute(
                self.authed(Method::POST, paths::TASKS, credential).json(draft),
                &Method::POST,
                paths::TASKS,
            )
            .await?;
        Ok(decode_echo(&body))
    }

    async fn update_task(
        &self,
        credential: &Credential,
        task: &Task,
    ) -> Result<Option<Task>, StoreError> {
        let path = paths::task(&task.id);
        let body = self
            .execute(
                self.authed(Method::PUT, &path, credential).json(task),
                &Method::PUT,
                &path,
            )
            .await?;
        Ok(decode_echo(&body))
    }

    async fn update_status(
        &self,
        credential: &Credential,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        let path = paths::task_status(id);
        let body = self
            .execute(
                self.authed(Method::PUT, &path, credential)
                    .json(&StatusUpdate { status }),
                &Method::PUT,
                &path,
            )
            .await?;
        Ok(decode_echo(&body))
    }

    async fn delete_task(&self, credential: &Credential, id: &TaskId) -> Result<(), StoreError> {
        let path = paths::task(id);
        self.execute(
            self.authed(Method::DELETE, &path, credential),
            &Method::DELETE,
            &path,
        )
        .await?;
        Ok(())
    }
}
