#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

//! Property-based tests for task listing normalization.
//!
//! Uses proptest to verify:
//! 1. Bare, `tasks`-wrapped and `data`-wrapped listings yield the same tasks.
//! 2. Malformed elements are counted and skipped without disturbing the
//!    order of the valid ones.
//! 3. Arbitrary JSON never causes a panic in `normalize`.
//! 4. Arbitrary bytes never cause a panic in `decode_listing`.

use proptest::prelude::*;
use serde_json::{Value, json};
use taskboard_proto::listing::{ListingShape, decode_listing, normalize};
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Priority, Subtask, Task, TaskStatus};

// --- Strategies ---

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![Just(TaskStatus::InProgress), Just(TaskStatus::Completed)]
}

/// Millisecond-precision instants between 2001 and 2033, or bare dates.
fn arb_moment() -> impl Strategy<Value = Moment> {
    prop_oneof![
        (1_000_000_000_000_i64..2_000_000_000_000).prop_filter_map("in range", Moment::from_millis),
        (1_000_000_000_000_i64..2_000_000_000_000).prop_filter_map("in range", |ms| {
            Moment::from_millis(ms).map(|m| Moment::Date(m.date_in(&chrono::Utc)))
        }),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9]{1,12}",
        "[^\x00]{0,40}",
        proptest::option::of("[^\x00]{0,80}"),
        proptest::option::of(arb_moment()),
        arb_priority(),
        arb_status(),
        proptest::option::of(arb_moment()),
        prop::collection::vec(("[a-z ]{1,10}", any::<bool>()), 0..4),
    )
        .prop_map(
            |(id, title, description, due, priority, status, created, subtasks)| {
                let mut task = Task::new(id, title);
                task.description = description;
                task.due_date = due;
                task.priority = priority;
                task.status = status;
                task.created_at = created;
                task.subtasks = subtasks
                    .into_iter()
                    .map(|(title, completed)| Subtask { title, completed })
                    .collect();
                task
            },
        )
}

/// JSON values that can never decode as a task.
fn arb_junk() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        "[^\x00]{0,20}".prop_map(Value::from),
        "[^\x00]{0,20}".prop_map(|title| json!({ "title": title })),
        "[a-z]{1,8}".prop_map(|id| json!({ "id": id, "title": "T", "status": "ARCHIVED" })),
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[^\x00]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::hash_map(
                prop_oneof![Just("tasks".to_string()), Just("data".to_string()), "[a-z]{1,6}"],
                inner,
                0..4
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

// --- Properties ---

proptest! {
    #[test]
    fn every_wrapping_yields_same_tasks(tasks in prop::collection::vec(arb_task(), 0..8)) {
        for shape in [ListingShape::Bare, ListingShape::Tasks, ListingShape::Data] {
            let listing = normalize(shape.wrap(&tasks));
            prop_assert_eq!(listing.shape, shape);
            prop_assert_eq!(listing.skipped, 0);
            prop_assert_eq!(&listing.tasks, &tasks);
        }
    }

    #[test]
    fn junk_is_skipped_in_place(
        tasks in prop::collection::vec(arb_task(), 0..6),
        junk in prop::collection::vec(arb_junk(), 0..6),
        seed in any::<u64>(),
    ) {
        // Interleave junk between the valid elements deterministically.
        let mut items: Vec<Value> = tasks
            .iter()
            .map(|t| serde_json::to_value(t).unwrap())
            .collect();
        for (i, j) in junk.iter().enumerate() {
            let slot = usize::try_from(seed.wrapping_add(i as u64) % (items.len() as u64 + 1))
                .unwrap();
            items.insert(slot, j.clone());
        }

        let listing = normalize(json!({ "data": items }));
        prop_assert_eq!(listing.skipped, junk.len());
        prop_assert_eq!(&listing.tasks, &tasks);
    }

    #[test]
    fn normalize_never_panics(value in arb_json()) {
        let listing = normalize(value);
        if listing.shape == ListingShape::Unrecognized {
            prop_assert!(listing.tasks.is_empty());
        }
    }

    #[test]
    fn decode_listing_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_listing(&bytes);
    }
}
