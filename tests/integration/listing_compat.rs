// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc
)]

//! Integration tests for task listing compatibility.
//!
//! Servers wrap the task list differently and are loose about field names
//! and timestamp formats. The client must see the same tasks regardless.
//!
//! These tests validate:
//! - Bare arrays, `{tasks: [...]}` and `{data: [...]}` load identically
//! - Unrecognized bodies load as an empty list, not an error
//! - Malformed elements are skipped, the rest still load
//! - `_id`, `created_at` and epoch-millisecond timestamps are understood
//! - Records carrying both `_id` and `id`, or a null priority, still load
//! - Duplicate ids keep their first occurrence

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use taskboard::cache::LoadOutcome;
use taskboard::context::AppContext;
use taskboard::coordinator::Coordinator;
use taskboard::store::TaskStore;
use taskboard::store::http::HttpTaskStore;
use taskboard::session::{Credential, Identity, Session};
use taskboard_proto::listing::ListingShape;
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Priority, Task, TaskId, TaskStatus};
use taskboard_stub::server::{StubState, start_server_with_state};

const EMAIL: &str = "wayne@bm.com";

async fn start_stub() -> (Arc<StubState>, HttpTaskStore, Credential) {
    let state = Arc::new(StubState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start stub server");
    let token = state.store.issue_token(EMAIL).await;
    let store = HttpTaskStore::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    (state, store, Credential::new(token))
}

fn sample_tasks() -> Vec<Task> {
    let mut first = Task::new("t-1", "First");
    first.priority = Priority::High;
    first.created_at = Some("2026-10-01T08:00:00Z".parse().unwrap());
    let mut second = Task::new("t-2", "Second");
    second.status = TaskStatus::Completed;
    second.due_date = Some("2026-10-20".parse().unwrap());
    vec![first, second]
}

#[tokio::test]
async fn all_wrapped_shapes_load_identically() {
    let (state, store, credential) = start_stub().await;
    for task in sample_tasks() {
        state.store.insert_task(EMAIL, task).await;
    }

    let mut loaded = Vec::new();
    for shape in [ListingShape::Bare, ListingShape::Tasks, ListingShape::Data] {
        state.store.set_listing_shape(shape).await;
        let listing = store.list_tasks(&credential).await.unwrap();
        assert_eq!(listing.shape, shape);
        assert_eq!(listing.skipped, 0);
        loaded.push(listing.tasks);
    }
    assert_eq!(loaded[0], sample_tasks());
    assert_eq!(loaded[0], loaded[1]);
    assert_eq!(loaded[0], loaded[2]);
}

#[tokio::test]
async fn unrecognized_body_loads_as_empty() {
    let (state, store, credential) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Hidden")).await;
    state.store.set_listing_shape(ListingShape::Unrecognized).await;

    let listing = store.list_tasks(&credential).await.unwrap();
    assert_eq!(listing.shape, ListingShape::Unrecognized);
    assert!(listing.tasks.is_empty());
}

#[tokio::test]
async fn malformed_elements_are_skipped() {
    let (state, store, credential) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Good")).await;
    state.store.push_listing_item(json!({ "title": "no id" })).await;
    state.store.push_listing_item(json!("not an object")).await;
    state.store.set_listing_shape(ListingShape::Tasks).await;

    let listing = store.list_tasks(&credential).await.unwrap();
    assert_eq!(listing.skipped, 2);
    assert_eq!(listing.tasks.len(), 1);
    assert_eq!(listing.tasks[0].title, "Good");
}

#[tokio::test]
async fn legacy_field_names_and_timestamps_are_understood() {
    let (state, store, credential) = start_stub().await;
    state
        .store
        .push_listing_item(json!({
            "_id": "legacy-1",
            "title": "Legacy",
            "priority": "medium",
            "status": "COMPLETED",
            "created_at": "2026-09-30T12:00:00Z",
            "updatedAt": 1_790_000_000_000_i64,
            "dueDate": "garbage",
        }))
        .await;

    let listing = store.list_tasks(&credential).await.unwrap();
    let task = &listing.tasks[0];
    assert_eq!(task.id, TaskId::new("legacy-1"));
    assert_eq!(task.priority, Priority::Medium);
    assert!(task.is_completed());
    assert!(task.created_at.is_none());
    assert_eq!(
        task.created_at_alt,
        Some("2026-09-30T12:00:00Z".parse::<Moment>().unwrap())
    );
    assert_eq!(task.updated_at, Moment::from_millis(1_790_000_000_000));
    assert!(task.due_date.is_none());
}

#[tokio::test]
async fn object_id_alongside_id_and_null_priority_still_load() {
    let (state, store, credential) = start_stub().await;
    state
        .store
        .push_listing_item(json!({
            "_id": "64f0c2",
            "id": "64f0c2",
            "title": "Mongo",
            "priority": null,
            "status": "IN_PROGRESS",
        }))
        .await;
    state
        .store
        .push_listing_item(json!({ "id": "t-2", "title": "Odd", "priority": "someday" }))
        .await;

    let listing = store.list_tasks(&credential).await.unwrap();
    assert_eq!(listing.skipped, 0);
    let ids: Vec<_> = listing.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["64f0c2", "t-2"]);
    assert!(listing.tasks.iter().all(|t| t.priority == Priority::Low));
}

#[tokio::test]
async fn duplicate_ids_keep_first_occurrence() {
    let (state, store, credential) = start_stub().await;
    state.store.insert_task(EMAIL, Task::new("t-1", "Original")).await;
    state
        .store
        .push_listing_item(json!({ "id": "t-1", "title": "Shadow" }))
        .await;
    state.store.set_listing_shape(ListingShape::Data).await;

    let mut co = Coordinator::new(AppContext::new(store));
    co.context_mut().sign_in(Session {
        identity: Identity::new(Some("Wayne"), EMAIL),
        credential,
    });
    let outcome = co.refresh().await.unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            count: 1,
            duplicates: 1
        }
    );
    assert_eq!(co.tasks()[0].title, "Original");
}
