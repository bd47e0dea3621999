// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc
)]

//! Integration tests for creating, editing, toggling and deleting tasks.
//!
//! These tests validate:
//! - Invalid drafts never reach the server
//! - Successful writes are followed by a refresh of the cache
//! - A status toggle shows the server's answer, or reverts on failure
//! - A refresh failing after a write does not undo the write
//! - The task form stays open with the server's message on failure

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use taskboard::cache::CacheError;
use taskboard::context::AppContext;
use taskboard::coordinator::{Coordinator, OperationError};
use taskboard::form::TaskForm;
use taskboard::store::http::HttpTaskStore;
use taskboard::validate::ValidationError;
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Priority, Subtask, Task, TaskDraft, TaskId, TaskStatus};
use taskboard_stub::server::{StubState, start_server_with_state};

const EMAIL: &str = "wayne@bm.com";
const PASSWORD: &str = "Wayne@123";

async fn signed_in() -> (Arc<StubState>, Coordinator<HttpTaskStore>) {
    let state = Arc::new(StubState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start stub server");
    state.store.add_account("Wayne", EMAIL, PASSWORD).await;

    let store = HttpTaskStore::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let mut co = Coordinator::new(AppContext::new(store));
    co.login(EMAIL, PASSWORD).await.unwrap();
    (state, co)
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn day_offset(days: i64) -> Moment {
    let today = now().date_naive();
    let date = if days >= 0 {
        today.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    Moment::Date(date.unwrap())
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.into(),
        ..TaskDraft::default()
    }
}

#[tokio::test]
async fn create_is_followed_by_refresh() {
    let (state, mut co) = signed_in().await;
    let new = TaskDraft {
        priority: Priority::High,
        due_date: Some(day_offset(1)),
        subtasks: vec![Subtask {
            title: "outline".into(),
            completed: false,
        }],
        ..draft("Write report")
    };

    let committed = co.create(&new, &now()).await.unwrap();
    assert!(committed.refresh_error.is_none());
    let created = committed.value.unwrap();
    assert_eq!(created.priority, Priority::High);
    assert!(created.created_at.is_some());

    assert_eq!(co.tasks().len(), 1);
    assert_eq!(co.tasks()[0].id, created.id);
    assert_eq!(state.store.tasks_of(EMAIL).await.len(), 1);
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_server() {
    let (state, mut co) = signed_in().await;
    // Any request would consume this fault and fail with 500.
    state.store.fail_next(1, 500, None).await;

    let err = co.create(&draft(""), &now()).await.unwrap_err();
    assert_eq!(err, OperationError::Validation(ValidationError::TitleEmpty));

    let overdue = TaskDraft {
        due_date: Some(day_offset(-1)),
        ..draft("Late")
    };
    let err = co.create(&overdue, &now()).await.unwrap_err();
    assert!(matches!(
        err,
        OperationError::Validation(ValidationError::DueDateInPast { .. })
    ));
    assert_eq!(err.user_message(), "Due date cannot be in the past.");

    assert!(co.refresh().await.is_err());
    assert!(state.store.tasks_of(EMAIL).await.is_empty());
}

#[tokio::test]
async fn update_replaces_editable_fields() {
    let (state, mut co) = signed_in().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Draft")).await;
    co.refresh().await.unwrap();

    let mut task = co.tasks()[0].clone();
    task.title = "Final".into();
    task.priority = Priority::Medium;
    let committed = co.update(&task, &now()).await.unwrap();
    assert!(committed.refresh_error.is_none());

    let stored = state.store.tasks_of(EMAIL).await;
    assert_eq!(stored[0].title, "Final");
    assert_eq!(stored[0].priority, Priority::Medium);
    assert_eq!(co.tasks()[0].title, "Final");
}

#[tokio::test]
async fn toggle_applies_server_status() {
    let (state, mut co) = signed_in().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Ship")).await;
    co.refresh().await.unwrap();

    let id = TaskId::new("t-1");
    let committed = co.toggle_status(&id).await.unwrap();
    assert_eq!(committed.value, TaskStatus::Completed);
    assert_eq!(co.cache().get(&id).unwrap().status, TaskStatus::Completed);
    assert_eq!(
        state.store.tasks_of(EMAIL).await[0].status,
        TaskStatus::Completed
    );

    let committed = co.toggle_status(&id).await.unwrap();
    assert_eq!(committed.value, TaskStatus::InProgress);
}

#[tokio::test]
async fn failed_toggle_reverts() {
    let (state, mut co) = signed_in().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Ship")).await;
    co.refresh().await.unwrap();

    state.store.fail_next(1, 500, None).await;
    let id = TaskId::new("t-1");
    let err = co.toggle_status(&id).await.unwrap_err();
    assert!(matches!(err, OperationError::Server { status: 500, .. }));
    assert_eq!(co.cache().get(&id).unwrap().status, TaskStatus::InProgress);
    assert!(!co.cache().status_state(&id).is_some_and(|s| s.is_pending()));
    assert_eq!(
        state.store.tasks_of(EMAIL).await[0].status,
        TaskStatus::InProgress
    );
}

#[tokio::test]
async fn toggle_of_unknown_task_is_refused_locally() {
    let (_state, mut co) = signed_in().await;
    co.refresh().await.unwrap();

    let err = co.toggle_status(&"missing".into()).await.unwrap_err();
    assert_eq!(
        err,
        OperationError::Cache(CacheError::UnknownTask("missing".into()))
    );
}

#[tokio::test]
async fn delete_removes_task() {
    let (state, mut co) = signed_in().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Old")).await;
    state.store.insert_task(EMAIL, Task::new("t-2", "Keep")).await;
    co.refresh().await.unwrap();

    co.delete(&"t-1".into()).await.unwrap();
    let ids: Vec<_> = co.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t-2"]);

    let err = co.delete(&"t-1".into()).await.unwrap_err();
    assert!(matches!(err, OperationError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn refresh_failure_after_write_is_reported_separately() {
    let (state, mut co) = signed_in().await;
    state.store.pass_next(1).await;
    state.store.fail_next(1, 502, None).await;

    let committed = co.create(&draft("Saved anyway"), &now()).await.unwrap();
    assert!(committed.value.is_some());
    let refresh_error = committed.refresh_error.unwrap();
    assert!(matches!(refresh_error, OperationError::Server { status: 502, .. }));
    assert!(co.context().session().is_some());
    assert_eq!(state.store.tasks_of(EMAIL).await.len(), 1);
}

#[tokio::test]
async fn form_shows_server_message_and_stays_open() {
    let (state, mut co) = signed_in().await;
    let mut form = TaskForm::new();
    form.open_new();
    form.draft_mut().title = "Too long?".into();

    state.store.fail_next(1, 422, Some("Title too long")).await;
    co.save_form(&mut form, &now()).await.unwrap_err();
    assert!(form.is_open());
    assert_eq!(form.error(), Some("Title too long"));

    co.save_form(&mut form, &now()).await.unwrap();
    assert!(!form.is_open());
    assert_eq!(co.tasks().len(), 1);
}

#[tokio::test]
async fn form_edit_updates_existing_task() {
    let (state, mut co) = signed_in().await;
    let mut task = Task::new("t-1", "Plan");
    task.due_date = Some(day_offset(3));
    state.store.insert_task(EMAIL, task).await;
    co.refresh().await.unwrap();

    let mut form = TaskForm::new();
    form.open_edit(&co.tasks()[0].clone(), &Utc);
    assert_eq!(form.editing_id(), Some(&TaskId::new("t-1")));
    form.draft_mut().description = Some("with details".into());
    co.save_form(&mut form, &now()).await.unwrap();

    let stored = state.store.tasks_of(EMAIL).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].description.as_deref(), Some("with details"));
    assert_eq!(stored[0].title, "Plan");
}
