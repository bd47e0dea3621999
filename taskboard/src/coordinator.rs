//! Mutation Coordinator.
//!
//! Owns the [`AppContext`] and the session's [`TaskCache`] and is the only
//! thing that talks to the store. Every operation follows the same rules:
//!
//! - local validation failures never reach the network;
//! - an authorization failure tears the session down before anything else
//!   is reported, and empties the cache;
//! - any other failure becomes an [`OperationError`] and leaves the cache
//!   as it was (apart from reverting an optimistic toggle);
//! - a successful write is followed by a full refresh. A failing refresh
//!   does not turn the write into a failure; it is reported alongside it
//!   in [`Committed::refresh_error`].

use chrono::{DateTime, TimeZone};
use taskboard_proto::auth::{LoginRequest, SignupRequest};
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskStatus};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheError, LoadOutcome, TaskCache};
use crate::context::AppContext;
use crate::form::{SAVE_FAILED, Submission, TaskForm};
use crate::session::{Credential, Identity, Session, TeardownReason};
use crate::store::{StoreError, TaskStore};
use crate::validate::{ValidationError, validate_draft};

/// Shown when the server cannot be reached.
pub const NETWORK_MESSAGE: &str = "Could not reach the server. Please try again.";
/// Shown when a request times out.
pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please try again.";
/// Shown for server failures without a message of their own.
pub const SERVER_MESSAGE: &str = "Server error. Please try again later.";
/// Shown when the session has been torn down.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
/// Shown for refused requests without a server message.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed. Please try again.";
/// Login failure without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed.";
/// Signup failure without a server message.
pub const SIGNUP_FAILED_MESSAGE: &str = "An error occurred. Please try again.";
/// Signup succeeded but the server did not sign the user in.
pub const SIGNUP_SUCCEEDED_MESSAGE: &str = "Registration successful! You can now log in.";

/// Why an operation did not happen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// The input was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session was torn down; the user must log in again.
    #[error("session ended: {0}")]
    SessionExpired(TeardownReason),

    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server failed.
    #[error("server error (HTTP {status})")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the server, if any.
        message: Option<String>,
    },

    /// The server refused the request.
    #[error("request rejected (HTTP {status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the server, if any.
        message: Option<String>,
    },

    /// The server answered with something unreadable.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The cache refused a local change.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl OperationError {
    /// Whether the session was torn down.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// Message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } | Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message: None, .. } => REQUEST_FAILED_MESSAGE.to_string(),
            _ => self.message_or(SERVER_MESSAGE),
        }
    }

    /// Text to show the user, with `fallback` for failures that carry no
    /// message of their own.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Cache(e) => e.to_string(),
            Self::SessionExpired(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Timeout => TIMEOUT_MESSAGE.to_string(),
            Self::Server { .. } | Self::Rejected { .. } | Self::Decode(_) => fallback.to_string(),
        }
    }
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized { status, .. } => {
                Self::SessionExpired(TeardownReason::AuthFailure { status })
            }
            StoreError::Timeout => Self::Timeout,
            StoreError::Network(e) => Self::Network(e),
            StoreError::Server { status, message } => Self::Server { status, message },
            StoreError::Rejected { status, message } => Self::Rejected { status, message },
            StoreError::Decode(e) => Self::Decode(e),
        }
    }
}

/// A write the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// What the write produced.
    pub value: T,
    /// Set when the refresh that followed the write failed.
    pub refresh_error: Option<OperationError>,
}

/// Result of a signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The server issued a token; the user is signed in.
    SignedIn(Identity),
    /// The account exists; the user must log in.
    Registered {
        /// Confirmation to show.
        message: String,
    },
}

/// Applies user actions against the store and keeps the cache in step.
pub struct Coordinator<S: TaskStore> {
    ctx: AppContext<S>,
    cache: TaskCache,
}

impl<S: TaskStore> Coordinator<S> {
    /// Creates a coordinator with an empty cache.
    pub fn new(ctx: AppContext<S>) -> Self {
        Self {
            ctx,
            cache: TaskCache::new(),
        }
    }

    /// The application context.
    pub const fn context(&self) -> &AppContext<S> {
        &self.ctx
    }

    /// Mutable access to the application context.
    pub const fn context_mut(&mut self) -> &mut AppContext<S> {
        &mut self.ctx
    }

    /// The task cache.
    pub const fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// The cached tasks.
    pub fn tasks(&self) -> &[Task] {
        self.cache.tasks()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Logs in and starts a session.
    ///
    /// # Errors
    ///
    /// Returns the classified store failure. A 401/403 here means bad
    /// credentials and is reported as [`OperationError::Rejected`].
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, OperationError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .ctx
            .store()
            .login(&request)
            .await
            .map_err(credential_rejection)?;

        let identity = Identity::from_record(&response.user, email);
        self.start_session(Session {
            identity: identity.clone(),
            credential: Credential::new(response.token),
        });
        Ok(identity)
    }

    /// Registers an account, signing in if the server issues a token.
    ///
    /// # Errors
    ///
    /// Returns the classified store failure.
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupOutcome, OperationError> {
        let request = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .ctx
            .store()
            .signup(&request)
            .await
            .map_err(credential_rejection)?;

        let Some(token) = response.token else {
            tracing::info!(user = %email, "account registered");
            return Ok(SignupOutcome::Registered {
                message: SIGNUP_SUCCEEDED_MESSAGE.to_string(),
            });
        };
        let identity = response.user.as_ref().map_or_else(
            || Identity::new(Some(name), email),
            |user| Identity::from_record(user, email),
        );
        self.start_session(Session {
            identity: identity.clone(),
            credential: Credential::new(token),
        });
        Ok(SignupOutcome::SignedIn(identity))
    }

    /// Ends the session at the user's request.
    pub fn logout(&mut self) {
        self.teardown(TeardownReason::Logout);
    }

    fn start_session(&mut self, session: Session) {
        self.cache.clear();
        self.ctx.sign_in(session);
    }

    fn teardown(&mut self, reason: TeardownReason) {
        self.cache.clear();
        self.ctx.teardown(reason);
    }

    /// Converts a store failure, tearing the session down on auth errors.
    fn escalate(&mut self, err: StoreError) -> OperationError {
        let err = OperationError::from(err);
        if let OperationError::SessionExpired(reason) = &err {
            self.teardown(*reason);
        }
        err
    }

    /// The current credential. Without one the session is torn down.
    fn credential(&mut self) -> Result<Credential, OperationError> {
        if let Some(credential) = self.ctx.credential() {
            return Ok(credential.clone());
        }
        let reason = TeardownReason::MissingCredential;
        self.teardown(reason);
        Err(OperationError::SessionExpired(reason))
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Reloads the task list.
    ///
    /// # Errors
    ///
    /// See [`refresh_until`](Self::refresh_until).
    pub async fn refresh(&mut self) -> Result<LoadOutcome, OperationError> {
        self.refresh_until(&CancellationToken::new()).await
    }

    /// Reloads the task list unless `cancel` fires first.
    ///
    /// Cancellation is silent: the cache is left untouched and
    /// [`LoadOutcome::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::SessionExpired`] if there is no session or
    /// the server rejects the credential (the cache is then emptied), or
    /// the classified failure otherwise (the cache keeps its contents).
    pub async fn refresh_until(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, OperationError> {
        let credential = self.credential()?;
        let ticket = self.cache.begin_load();
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            () = ticket.token().cancelled() => None,
            r = self.ctx.store().list_tasks(&credential) => Some(r),
        };

        match result {
            None => {
                self.cache.cancel_load();
                tracing::debug!(generation = ticket.generation(), "task load cancelled");
                Ok(LoadOutcome::Cancelled)
            }
            Some(Ok(listing)) => {
                let outcome = self.cache.finish_load(&ticket, listing.tasks);
                tracing::debug!(?outcome, shape = ?listing.shape, "task load finished");
                Ok(outcome)
            }
            Some(Err(e)) => {
                self.cache.abandon_load(&ticket);
                tracing::debug!(error = %e, "task load failed");
                Err(self.escalate(e))
            }
        }
    }

    /// Refreshes after a successful write, reporting the refresh separately.
    async fn commit<T>(&mut self, value: T) -> Committed<T> {
        let refresh_error = match self.refresh().await {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "refresh after write failed");
                Some(e)
            }
        };
        Committed {
            value,
            refresh_error,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Creates a task.
    ///
    /// Returns the created record when the server echoes one.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Validation`] without contacting the server
    /// if the draft is invalid at `now`, otherwise the classified failure.
    pub async fn create<Tz: TimeZone>(
        &mut self,
        draft: &TaskDraft,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Option<Task>>, OperationError> {
        validate_draft(draft, now)?;
        let credential = self.credential()?;
        let created = self.ctx.store().create_task(&credential, draft).await;
        let created = created.map_err(|e| self.escalate(e))?;
        tracing::info!(task_id = ?created.as_ref().map(|t| t.id.as_str()), "task created");
        Ok(self.commit(created).await)
    }

    /// Replaces a task with `task`.
    ///
    /// # Errors
    ///
    /// As for [`create`](Self::create).
    pub async fn update<Tz: TimeZone>(
        &mut self,
        task: &Task,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Option<Task>>, OperationError> {
        validate_draft(&TaskDraft::from(task), now)?;
        let credential = self.credential()?;
        let updated = self.ctx.store().update_task(&credential, task).await;
        let updated = updated.map_err(|e| self.escalate(e))?;
        tracing::info!(task_id = %task.id, "task updated");
        Ok(self.commit(updated).await)
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns the classified store failure.
    pub async fn delete(&mut self, id: &TaskId) -> Result<Committed<()>, OperationError> {
        let credential = self.credential()?;
        let deleted = self.ctx.store().delete_task(&credential, id).await;
        deleted.map_err(|e| self.escalate(e))?;
        tracing::info!(task_id = %id, "task deleted");
        Ok(self.commit(()).await)
    }

    /// Flips a task between in-progress and completed.
    ///
    /// The new status is visible in the cache immediately. It is replaced by
    /// the server's answer on success, or by the previous status on failure.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Cache`] if the task is unknown or already
    /// being toggled, otherwise the classified store failure.
    pub async fn toggle_status(
        &mut self,
        id: &TaskId,
    ) -> Result<Committed<TaskStatus>, OperationError> {
        let credential = self.credential()?;
        let ticket = self.cache.begin_toggle(id)?;
        let result = self
            .ctx
            .store()
            .update_status(&credential, id, ticket.to)
            .await;

        match result {
            Ok(echo) => {
                let confirmed = echo
                    .filter(|t| &t.id == id)
                    .map_or(ticket.to, |t| t.status);
                self.cache.confirm_toggle(&ticket, confirmed);
                tracing::info!(task_id = %id, status = %confirmed, "task status changed");
                Ok(self.commit(confirmed).await)
            }
            Err(e) => {
                self.cache.revert_toggle(&ticket);
                tracing::info!(task_id = %id, error = %e, "status change failed, reverted");
                Err(self.escalate(e))
            }
        }
    }

    /// Saves the form: creates when it is new, updates when editing.
    ///
    /// On success the form is closed. A validation error or a non-auth
    /// failure is shown on the form, which stays open. An auth failure
    /// closes it along with the session.
    ///
    /// # Errors
    ///
    /// Returns the failure that prevented the save.
    pub async fn save_form<Tz: TimeZone>(
        &mut self,
        form: &mut TaskForm,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Option<Task>>, OperationError> {
        let result = match form.submission() {
            Submission::Create(draft) => self.create(&draft, now).await,
            Submission::Update(task) => self.update(&task, now).await,
        };
        match &result {
            Ok(_) => form.close(),
            Err(e) if e.is_session_expired() => form.close(),
            Err(e) => form.set_error(e.message_or(SAVE_FAILED)),
        }
        result
    }
}

/// At login/signup a 401/403 means the credentials were wrong, not that a
/// session expired. The server's explanation is kept for the user.
fn credential_rejection(err: StoreError) -> OperationError {
    match err {
        StoreError::Unauthorized { status, message } => {
            OperationError::Rejected { status, message }
        }
        other => other.into(),
    }
}
