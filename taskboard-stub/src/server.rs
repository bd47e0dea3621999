//! HTTP routes of the stub task API.
//!
//! Mirrors the real service: JSON in and out, `Authorization: Bearer` on
//! every task route, and `{"message": ...}` bodies on failure. Each request
//! first consumes a scripted fault, if one is queued.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use serde_json::Value;
use taskboard_proto::auth::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use taskboard_proto::codec::ErrorBody;
use taskboard_proto::paths;
use taskboard_proto::task::{StatusUpdate, Task, TaskDraft, TaskId};
use tokio::task::JoinHandle;

use crate::store::{StubError, StubStore};

/// Shared state of a running stub server.
#[derive(Debug, Default)]
pub struct StubState {
    /// Accounts, tokens, tasks and scripted faults.
    pub store: StubStore,
}

impl StubState {
    /// Creates state with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.body_message() {
            Some(message) => (status, Json(ErrorBody::new(message))).into_response(),
            None => status.into_response(),
        }
    }
}

/// Builds the router for the task API.
pub fn router(state: Arc<StubState>) -> axum::Router {
    let task_path = format!("{}/{{id}}", paths::TASKS);
    let status_path = format!("{task_path}/status");

    axum::Router::new()
        .route(paths::LOGIN, post(login))
        .route(paths::SIGNUP, post(signup))
        .route(paths::TASKS, axum::routing::get(list_tasks).post(create_task))
        .route(&task_path, put(update_task).delete(delete_task))
        .route(&status_path, put(update_status))
        .with_state(state)
}

/// Starts the stub server on `addr` with empty state.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn start_server(addr: &str) -> Result<(SocketAddr, JoinHandle<()>), std::io::Error> {
    start_server_with_state(addr, Arc::new(StubState::new())).await
}

/// Starts the stub server with pre-configured [`StubState`].
///
/// Returns the bound address (useful with port 0) and the server task.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<StubState>,
) -> Result<(SocketAddr, JoinHandle<()>), std::io::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "stub server error");
        }
    });

    Ok((bound_addr, handle))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Consumes a fault, then resolves the caller's account.
async fn authenticate(state: &StubState, headers: &HeaderMap) -> Result<String, StubError> {
    state.store.take_fault().await?;
    state.store.authorize(bearer(headers)).await.inspect_err(|_| {
        tracing::info!("request with missing or unknown token");
    })
}

async fn login(
    State(state): State<Arc<StubState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StubError> {
    state.store.take_fault().await?;
    let response = state.store.login(&request).await?;
    tracing::info!(email = %request.email, "login");
    Ok(Json(response))
}

async fn signup(
    State(state): State<Arc<StubState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), StubError> {
    state.store.take_fault().await?;
    let response = state.store.signup(&request).await?;
    tracing::info!(email = %request.email, "signup");
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_tasks(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StubError> {
    let owner = authenticate(&state, &headers).await?;
    Ok(Json(state.store.listing(&owner).await))
}

async fn create_task(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), StubError> {
    let owner = authenticate(&state, &headers).await?;
    let task = state.store.create(&owner, &draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(task): Json<Task>,
) -> Result<Json<Task>, StubError> {
    let owner = authenticate(&state, &headers).await?;
    let task = state.store.update(&owner, &TaskId::new(id), &task).await?;
    Ok(Json(task))
}

async fn update_status(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Task>, StubError> {
    let owner = authenticate(&state, &headers).await?;
    let task = state
        .store
        .update_status(&owner, &TaskId::new(id), update.status)
        .await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ErrorBody>, StubError> {
    let owner = authenticate(&state, &headers).await?;
    state.store.delete(&owner, &TaskId::new(id)).await?;
    Ok(Json(ErrorBody::new("Task deleted")))
}
