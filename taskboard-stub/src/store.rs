//! In-memory accounts, tokens and tasks behind the stub routes.
//!
//! Tasks belong to the account whose token created them; a token only sees
//! its owner's tasks. Scripted faults are consumed one per request, before
//! authentication, so a test can make "the next two requests" fail with any
//! status regardless of what they are.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use serde_json::Value;
use taskboard_proto::auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse, UserRecord};
use taskboard_proto::listing::ListingShape;
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskStatus};
use tokio::sync::RwLock;

/// A request the stub refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    /// Missing, unknown or revoked bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login with an unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Signup with an email that is already registered.
    #[error("User already exists")]
    UserExists,

    /// No task with this id belongs to the caller.
    #[error("Task {0} not found")]
    NotFound(TaskId),

    /// The payload is well-formed JSON but not acceptable.
    #[error("{0}")]
    BadRequest(String),

    /// A scripted failure.
    #[error("{}", .message.as_deref().unwrap_or("Injected failure"))]
    Injected {
        /// HTTP status to answer with.
        status: u16,
        /// Message for the error body; `None` sends an empty body.
        message: Option<String>,
    },
}

impl StubError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::InvalidCredentials | Self::BadRequest(_) => 400,
            Self::UserExists => 409,
            Self::NotFound(_) => 404,
            Self::Injected { status, .. } => *status,
        }
    }

    /// Message for the `{"message": ...}` body, if one should be sent.
    #[must_use]
    pub fn body_message(&self) -> Option<String> {
        match self {
            Self::Injected { message, .. } => message.clone(),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug)]
struct Account {
    id: String,
    name: String,
    password: String,
}

#[derive(Debug)]
struct StoredTask {
    owner: String,
    task: Task,
}

#[derive(Debug)]
struct StoreInner {
    accounts: HashMap<String, Account>,
    /// Token to account email.
    tokens: HashMap<String, String>,
    tasks: Vec<StoredTask>,
    shape: ListingShape,
    signup_signs_in: bool,
    /// Extra raw elements appended to every listing.
    extra_items: Vec<Value>,
    /// Scripted outcomes; `None` lets a request through.
    faults: VecDeque<Option<StubError>>,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            tasks: Vec::new(),
            shape: ListingShape::Bare,
            signup_signs_in: true,
            extra_items: Vec::new(),
            faults: VecDeque::new(),
        }
    }
}

/// State of the stub service.
#[derive(Debug, Default)]
pub struct StubStore {
    inner: RwLock<StoreInner>,
}

impl StubStore {
    /// Creates an empty store that answers listings as a bare array and
    /// signs new accounts in on signup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Test controls
    // -----------------------------------------------------------------------

    /// Registers an account directly.
    pub async fn add_account(&self, name: &str, email: &str, password: &str) {
        self.inner.write().await.accounts.insert(
            email.to_string(),
            Account {
                id: new_id(),
                name: name.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Issues a token for `email` without a login request.
    pub async fn issue_token(&self, email: &str) -> String {
        let token = new_token();
        self.inner
            .write()
            .await
            .tokens
            .insert(token.clone(), email.to_string());
        token
    }

    /// Invalidates every issued token.
    pub async fn revoke_all_tokens(&self) {
        let mut inner = self.inner.write().await;
        tracing::info!(count = inner.tokens.len(), "revoking all tokens");
        inner.tokens.clear();
    }

    /// Stores `task` as belonging to `owner`.
    pub async fn insert_task(&self, owner: &str, task: Task) {
        self.inner.write().await.tasks.push(StoredTask {
            owner: owner.to_string(),
            task,
        });
    }

    /// Snapshot of `owner`'s tasks.
    pub async fn tasks_of(&self, owner: &str) -> Vec<Task> {
        self.inner
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.owner == owner)
            .map(|t| t.task.clone())
            .collect()
    }

    /// How `GET /api/tasks` wraps its array from now on.
    pub async fn set_listing_shape(&self, shape: ListingShape) {
        self.inner.write().await.shape = shape;
    }

    /// Whether signup returns a token (`true`) or only a confirmation.
    pub async fn set_signup_signs_in(&self, signs_in: bool) {
        self.inner.write().await.signup_signs_in = signs_in;
    }

    /// Appends a raw element to every listing, e.g. a malformed task.
    pub async fn push_listing_item(&self, item: Value) {
        self.inner.write().await.extra_items.push(item);
    }

    /// Fails the next `count` requests with `status` and `message`.
    pub async fn fail_next(&self, count: usize, status: u16, message: Option<&str>) {
        let mut inner = self.inner.write().await;
        for _ in 0..count {
            inner.faults.push_back(Some(StubError::Injected {
                status,
                message: message.map(str::to_string),
            }));
        }
    }

    /// Lets the next `count` requests through before any queued fault applies.
    pub async fn pass_next(&self, count: usize) {
        let mut inner = self.inner.write().await;
        inner.faults.extend(std::iter::repeat_n(None, count));
    }

    /// Consumes one scripted fault, if any is queued.
    ///
    /// # Errors
    ///
    /// Returns the queued [`StubError::Injected`].
    pub async fn take_fault(&self) -> Result<(), StubError> {
        self.inner
            .write()
            .await
            .faults
            .pop_front()
            .flatten()
            .map_or(Ok(()), Err)
    }

    // -----------------------------------------------------------------------
    // API operations
    // -----------------------------------------------------------------------

    /// Checks credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::InvalidCredentials`] for an unknown email or
    /// wrong password.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, StubError> {
        let mut inner = self.inner.write().await;
        let user = match inner.accounts.get(&request.email) {
            Some(account) if account.password == request.password => {
                user_record(account, &request.email)
            }
            _ => return Err(StubError::InvalidCredentials),
        };
        let token = new_token();
        inner.tokens.insert(token.clone(), request.email.clone());
        Ok(LoginResponse { token, user })
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::UserExists`] if the email is taken, or
    /// [`StubError::BadRequest`] if a field is blank.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, StubError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(StubError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&request.email) {
            return Err(StubError::UserExists);
        }
        let account = Account {
            id: new_id(),
            name: request.name.clone(),
            password: request.password.clone(),
        };
        let user = user_record(&account, &request.email);
        inner.accounts.insert(request.email.clone(), account);

        let token = inner.signup_signs_in.then(new_token);
        if let Some(token) = &token {
            inner.tokens.insert(token.clone(), request.email.clone());
        }
        Ok(SignupResponse {
            message: Some("User created".to_string()),
            token,
            user: Some(user),
        })
    }

    /// Resolves a bearer token to its account email.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::Unauthorized`] for a missing or unknown token.
    pub async fn authorize(&self, token: Option<&str>) -> Result<String, StubError> {
        let inner = self.inner.read().await;
        token
            .and_then(|t| inner.tokens.get(t))
            .cloned()
            .ok_or(StubError::Unauthorized)
    }

    /// The owner's tasks, wrapped in the configured listing shape.
    pub async fn listing(&self, owner: &str) -> Value {
        let inner = self.inner.read().await;
        let tasks: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| t.owner == owner)
            .map(|t| t.task.clone())
            .collect();
        let mut body = inner.shape.wrap(&tasks);
        let items = match &mut body {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.values_mut().find_map(Value::as_array_mut),
            _ => None,
        };
        if let Some(items) = items {
            items.extend(inner.extra_items.iter().cloned());
        }
        body
    }

    /// Stores a new task for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::BadRequest`] if the title is empty.
    pub async fn create(&self, owner: &str, draft: &TaskDraft) -> Result<Task, StubError> {
        if draft.title.is_empty() {
            return Err(StubError::BadRequest("Title is required".to_string()));
        }
        let now = Moment::from(Utc::now());
        let mut task = draft.apply_to(&Task::new(new_id(), ""));
        task.created_at = Some(now);
        task.updated_at = Some(now);
        self.inner.write().await.tasks.push(StoredTask {
            owner: owner.to_string(),
            task: task.clone(),
        });
        tracing::debug!(task_id = %task.id, owner, "task created");
        Ok(task)
    }

    /// Replaces the editable fields of one of `owner`'s tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::NotFound`] if `owner` has no task `id`.
    pub async fn update(&self, owner: &str, id: &TaskId, task: &Task) -> Result<Task, StubError> {
        self.modify(owner, id, |stored| *stored = TaskDraft::from(task).apply_to(stored))
            .await
    }

    /// Sets the status of one of `owner`'s tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::NotFound`] if `owner` has no task `id`.
    pub async fn update_status(
        &self,
        owner: &str,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, StubError> {
        self.modify(owner, id, |stored| stored.status = status).await
    }

    /// Deletes one of `owner`'s tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StubError::NotFound`] if `owner` has no task `id`.
    pub async fn delete(&self, owner: &str, id: &TaskId) -> Result<(), StubError> {
        let mut inner = self.inner.write().await;
        let index = inner
            .tasks
            .iter()
            .position(|t| t.owner == owner && &t.task.id == id)
            .ok_or_else(|| StubError::NotFound(id.clone()))?;
        inner.tasks.remove(index);
        drop(inner);
        tracing::debug!(task_id = %id, owner, "task deleted");
        Ok(())
    }

    async fn modify(
        &self,
        owner: &str,
        id: &TaskId,
        change: impl FnOnce(&mut Task),
    ) -> Result<Task, StubError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .tasks
            .iter_mut()
            .find(|t| t.owner == owner && &t.task.id == id)
            .ok_or_else(|| StubError::NotFound(id.clone()))?;
        change(&mut stored.task);
        stored.task.updated_at = Some(Moment::from(Utc::now()));
        Ok(stored.task.clone())
    }
}

fn user_record(account: &Account, email: &str) -> UserRecord {
    UserRecord {
        id: account.id.clone(),
        name: Some(account.name.clone()),
        email: Some(email.to_string()),
    }
}

fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

fn new_token() -> String {
    format!("stub-{}", uuid::Uuid::now_v7().simple())
}
