//! In-process task store for testing.
//!
//! Keeps accounts, tokens and tasks in memory behind a `parking_lot` mutex.
//! Failures can be scripted with [`MemoryTaskStore::fail_next`] and every
//! call is recorded so tests can assert on what reached the "server".

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use taskboard_proto::auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse, UserRecord};
use taskboard_proto::listing::{Listing, ListingShape};
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskStatus};

use super::{StoreError, TaskStore};
use crate::session::Credential;

/// A store operation, as recorded in [`MemoryTaskStore::calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `login`.
    Login,
    /// `signup`.
    Signup,
    /// `list_tasks`.
    List,
    /// `create_task`.
    Create,
    /// `update_task` on this id.
    Update(TaskId),
    /// `update_status` on this id with this status.
    UpdateStatus(TaskId, TaskStatus),
    /// `delete_task` on this id.
    Delete(TaskId),
}

#[derive(Debug)]
struct Account {
    id: String,
    name: String,
    password: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    tasks: Vec<Task>,
    /// Scripted outcomes; `None` lets a call through.
    failures: VecDeque<Option<StoreError>>,
    calls: Vec<Call>,
}

/// In-memory [`TaskStore`] with scripted failures and optional latency.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    state: Mutex<MemoryState>,
    latency: Duration,
}

impl MemoryTaskStore {
    /// Creates an empty store that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer by `latency` (use with a paused tokio clock).
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Registers an account.
    pub fn add_account(&self, name: &str, email: &str, password: &str) {
        self.state.lock().accounts.insert(
            email.to_string(),
            Account {
                id: format!("user-{}", uuid::Uuid::now_v7()),
                name: name.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Issues a token for `email` without going through login.
    #[must_use]
    pub fn issue_token(&self, email: &str) -> Credential {
        let token = format!("tok-{}", uuid::Uuid::now_v7());
        self.state
            .lock()
            .tokens
            .insert(token.clone(), email.to_string());
        Credential::new(token)
    }

    /// Invalidates every issued token.
    pub fn revoke_all_tokens(&self) {
        self.state.lock().tokens.clear();
    }

    /// Seeds a task as if the server had stored it.
    pub fn insert_task(&self, task: Task) {
        self.state.lock().tasks.push(task);
    }

    /// Snapshot of the stored tasks.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Makes the next call (of any kind) fail with `error`. Queued in order.
    pub fn fail_next(&self, error: StoreError) {
        self.state.lock().failures.push_back(Some(error));
    }

    /// Lets the next call through before any queued failure applies.
    pub fn pass_next(&self) {
        self.state.lock().failures.push_back(None);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Records the call and pops a scripted failure, if one is queued.
    async fn enter(&self, call: Call) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock();
        state.calls.push(call);
        state.failures.pop_front().flatten().map_or(Ok(()), Err)
    }

    fn authorize(state: &MemoryState, credential: &Credential) -> Result<(), StoreError> {
        if state.tokens.contains_key(credential.expose()) {
            Ok(())
        } else {
            Err(StoreError::Unauthorized {
                status: 401,
                message: None,
            })
        }
    }

    fn not_found(id: &TaskId) -> StoreError {
        StoreError::Rejected {
            status: 404,
            message: Some(format!("Task {id} not found")),
        }
    }
}

impl TaskStore for MemoryTaskStore {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, StoreError> {
        self.enter(Call::Login).await?;
        let mut state = self.state.lock();
        let (id, name) = match state.accounts.get(&request.email) {
            Some(account) if account.password == request.password => {
                (account.id.clone(), account.name.clone())
            }
            _ => {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: Some("Invalid credentials".to_string()),
                });
            }
        };
        let token = format!("tok-{}", uuid::Uuid::now_v7());
        state.tokens.insert(token.clone(), request.email.clone());
        Ok(LoginResponse {
            token,
            user: UserRecord {
                id,
                name: Some(name),
                email: Some(request.email.clone()),
            },
        })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, StoreError> {
        self.enter(Call::Signup).await?;
        let mut state = self.state.lock();
        if state.accounts.contains_key(&request.email) {
            return Err(StoreError::Rejected {
                status: 409,
                message: Some("User already exists".to_string()),
            });
        }
        state.accounts.insert(
            request.email.clone(),
            Account {
                id: format!("user-{}", uuid::Uuid::now_v7()),
                name: request.name.clone(),
                password: request.password.clone(),
            },
        );
        Ok(SignupResponse {
            message: Some("User created".to_string()),
            token: None,
            user: None,
        })
    }

    async fn list_tasks(&self, credential: &Credential) -> Result<Listing, StoreError> {
        self.enter(Call::List).await?;
        let state = self.state.lock();
        Self::authorize(&state, credential)?;
        Ok(Listing {
            shape: ListingShape::Bare,
            tasks: state.tasks.clone(),
            skipped: 0,
        })
    }

    async fn create_task(
        &self,
        credential: &Credential,
        draft: &TaskDraft,
    ) -> Result<Option<Task>, StoreError> {
        self.enter(Call::Create).await?;
        let mut state = self.state.lock();
        Self::authorize(&state, credential)?;
        let now = Moment::from(Utc::now());
        let mut task = draft.apply_to(&Task::new(uuid::Uuid::now_v7().to_string(), ""));
        task.created_at = Some(now);
        task.updated_at = Some(now);
        state.tasks.push(task.clone());
        Ok(Some(task))
    }

    async fn update_task(
        &self,
        credential: &Credential,
        task: &Task,
    ) -> Result<Option<Task>, StoreError> {
        self.enter(Call::Update(task.id.clone())).await?;
        let mut state = self.state.lock();
        Self::authorize(&state, credential)?;
        let stored = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| Self::not_found(&task.id))?;
        let mut updated = TaskDraft::from(task).apply_to(stored);
        updated.updated_at = Some(Moment::from(Utc::now()));
        *stored = updated.clone();
        Ok(Some(updated))
    }

    async fn update_status(
        &self,
        credential: &Credential,
        id: &TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        self.enter(Call::UpdateStatus(id.clone(), status)).await?;
        let mut state = self.state.lock();
        Self::authorize(&state, credential)?;
        let stored = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        stored.status = status;
        stored.updated_at = Some(Moment::from(Utc::now()));
        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, credential: &Credential, id: &TaskId) -> Result<(), StoreError> {
        self.enter(Call::Delete(id.clone())).await?;
        let mut state = self.state.lock();
        Self::authorize(&state, credential)?;
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}
