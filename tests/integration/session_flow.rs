// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc
)]

//! Integration tests for sign-in, sign-up and session teardown.
//!
//! Each test starts a `taskboard-stub` server on an ephemeral port and
//! drives it through the real HTTP store and the coordinator.
//!
//! These tests validate:
//! - Login starts a session; bad credentials leave the user signed out
//! - Signup either signs in directly or asks the user to log in
//! - A 401/403 on any task request tears the session down and empties the cache
//! - Server failures leave the session intact
//! - A saved session survives a restart of the client

use std::sync::Arc;
use std::time::Duration;

use taskboard::context::AppContext;
use taskboard::coordinator::{
    Coordinator, LOGIN_FAILED_MESSAGE, OperationError, SIGNUP_FAILED_MESSAGE,
    SIGNUP_SUCCEEDED_MESSAGE, SignupOutcome,
};
use taskboard::session::{SessionFile, SessionPhase, TeardownReason};
use taskboard::store::http::HttpTaskStore;
use taskboard_proto::task::Task;
use taskboard_stub::server::{StubState, start_server_with_state};

const EMAIL: &str = "wayne@bm.com";
const PASSWORD: &str = "Wayne@123";

async fn start_stub() -> (Arc<StubState>, String) {
    let state = Arc::new(StubState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start stub server");
    state.store.add_account("Bruce Wayne", EMAIL, PASSWORD).await;
    (state, format!("http://{addr}"))
}

fn coordinator(base: &str) -> Coordinator<HttpTaskStore> {
    let store = HttpTaskStore::new(base, Duration::from_secs(5)).unwrap();
    Coordinator::new(AppContext::new(store))
}

fn temp_session_file() -> SessionFile {
    let dir = std::env::temp_dir().join(format!("taskboard-it-{}", uuid::Uuid::now_v7()));
    SessionFile::new(dir.join("session.json"))
}

#[tokio::test]
async fn login_starts_session_and_lists_own_tasks() {
    let (state, base) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Mine")).await;
    state.store.insert_task("other@x.io", Task::new("t-2", "Theirs")).await;

    let mut co = coordinator(&base);
    let identity = co.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(identity.name, "Bruce Wayne");
    assert_eq!(identity.email, EMAIL);
    assert!(matches!(co.context().phase(), SessionPhase::SignedIn(_)));

    co.refresh().await.unwrap();
    let titles: Vec<_> = co.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Mine"]);
}

#[tokio::test]
async fn wrong_password_is_rejected_without_session() {
    let (_state, base) = start_stub().await;
    let mut co = coordinator(&base);

    let err = co.login(EMAIL, "wrong").await.unwrap_err();
    assert!(matches!(err, OperationError::Rejected { status: 400, .. }));
    assert_eq!(err.message_or(LOGIN_FAILED_MESSAGE), "Invalid credentials");
    assert!(co.context().session().is_none());
    assert_eq!(co.context().phase(), SessionPhase::SignedOut(None));
}

#[tokio::test]
async fn login_401_without_message_uses_login_fallback() {
    let (state, base) = start_stub().await;
    state.store.fail_next(1, 401, None).await;
    let mut co = coordinator(&base);

    let err = co.login(EMAIL, PASSWORD).await.unwrap_err();
    assert!(!err.is_session_expired());
    assert_eq!(err.message_or(LOGIN_FAILED_MESSAGE), LOGIN_FAILED_MESSAGE);
}

#[tokio::test]
async fn login_401_shows_server_message() {
    let (state, base) = start_stub().await;
    state
        .store
        .fail_next(1, 401, Some("Invalid email or password"))
        .await;
    let mut co = coordinator(&base);

    let err = co.login(EMAIL, PASSWORD).await.unwrap_err();
    assert!(!err.is_session_expired());
    assert!(matches!(err, OperationError::Rejected { status: 401, .. }));
    assert_eq!(
        err.message_or(LOGIN_FAILED_MESSAGE),
        "Invalid email or password"
    );
    assert_eq!(co.context().phase(), SessionPhase::SignedOut(None));
}

#[tokio::test]
async fn signup_with_token_signs_in() {
    let (_state, base) = start_stub().await;
    let mut co = coordinator(&base);

    let outcome = co.signup("Ada", "ada@x.io", "pw").await.unwrap();
    assert!(matches!(outcome, SignupOutcome::SignedIn(ref id) if id.name == "Ada"));
    co.refresh().await.unwrap();
    assert!(co.tasks().is_empty());
}

#[tokio::test]
async fn signup_without_token_asks_for_login() {
    let (state, base) = start_stub().await;
    state.store.set_signup_signs_in(false).await;
    let mut co = coordinator(&base);

    let outcome = co.signup("Ada", "ada@x.io", "pw").await.unwrap();
    assert_eq!(
        outcome,
        SignupOutcome::Registered {
            message: SIGNUP_SUCCEEDED_MESSAGE.to_string()
        }
    );
    assert!(co.context().session().is_none());
    co.login("ada@x.io", "pw").await.unwrap();
}

#[tokio::test]
async fn duplicate_signup_shows_server_message() {
    let (_state, base) = start_stub().await;
    let mut co = coordinator(&base);

    let err = co.signup("Wayne", EMAIL, "pw").await.unwrap_err();
    assert_eq!(err.message_or(SIGNUP_FAILED_MESSAGE), "User already exists");
}

#[tokio::test]
async fn revoked_token_tears_down_session() {
    let (state, base) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Mine")).await;
    let mut co = coordinator(&base);
    co.login(EMAIL, PASSWORD).await.unwrap();
    co.refresh().await.unwrap();
    assert_eq!(co.tasks().len(), 1);

    let mut phase = co.context().subscribe();
    state.store.revoke_all_tokens().await;

    let err = co.refresh().await.unwrap_err();
    assert_eq!(
        err,
        OperationError::SessionExpired(TeardownReason::AuthFailure { status: 401 })
    );
    assert!(co.context().session().is_none());
    assert!(co.tasks().is_empty());
    assert!(phase.has_changed().unwrap());
    assert!(phase.borrow_and_update().requires_login());
}

#[tokio::test]
async fn forbidden_on_delete_tears_down_session() {
    let (state, base) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Mine")).await;
    let mut co = coordinator(&base);
    co.login(EMAIL, PASSWORD).await.unwrap();

    state.store.fail_next(1, 403, Some("Forbidden")).await;
    let err = co.delete(&"t-1".into()).await.unwrap_err();
    assert!(err.is_session_expired());
    assert!(co.context().credential().is_none());
    assert_eq!(state.store.tasks_of(EMAIL).await.len(), 1);
}

#[tokio::test]
async fn server_error_keeps_session() {
    let (state, base) = start_stub().await;
    let mut co = coordinator(&base);
    co.login(EMAIL, PASSWORD).await.unwrap();

    state.store.fail_next(1, 503, Some("Database unavailable")).await;
    let err = co.refresh().await.unwrap_err();
    assert!(matches!(err, OperationError::Server { status: 503, .. }));
    assert_eq!(err.user_message(), "Database unavailable");
    assert!(co.context().session().is_some());

    co.refresh().await.unwrap();
}

#[tokio::test]
async fn saved_session_survives_client_restart() {
    let (state, base) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Mine")).await;
    let file = temp_session_file();

    let store = HttpTaskStore::new(&base, Duration::from_secs(5)).unwrap();
    let mut first = Coordinator::new(AppContext::new(store).with_session_file(file.clone()));
    first.login(EMAIL, PASSWORD).await.unwrap();
    drop(first);

    let store = HttpTaskStore::new(&base, Duration::from_secs(5)).unwrap();
    let mut ctx = AppContext::new(store).with_session_file(file.clone());
    assert!(ctx.restore());
    let mut second = Coordinator::new(ctx);
    second.refresh().await.unwrap();
    assert_eq!(second.tasks().len(), 1);

    second.logout();
    assert!(!file.path().exists());
}

#[tokio::test]
async fn task_request_without_session_requires_login() {
    let (_state, base) = start_stub().await;
    let mut co = coordinator(&base);

    let err = co.refresh().await.unwrap_err();
    assert_eq!(
        err,
        OperationError::SessionExpired(TeardownReason::MissingCredential)
    );
    assert!(co.context().phase().requires_login());
}
