#![allow(clippy::unwrap_used)]

//! Property-based tests for the view derivation engine.
//!
//! Uses proptest to verify, for any task collection, filter choice and
//! viewer clock:
//! 1. The dashboard holds only incomplete tasks that pass every filter.
//! 2. With default filters the dashboard holds every incomplete task.
//! 3. Dashboard and completed views are ordered by their sort key.
//! 4. Dashboard and completed views partition the collection.
//! 5. Stats counts add up and the completion percentage is bounded.
//! 6. Insights never count more tasks than they could apply to.
//! 7. Derivation is deterministic.

use chrono::{DateTime, FixedOffset, TimeZone};
use proptest::prelude::*;
use taskboard::views::derive::matches_date;
use taskboard::views::{
    self, CompletedSort, DateFilter, FilterSet, Insights, PriorityFilter, SortOrder, TaskStats,
    sort_key,
};
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Priority, Task, TaskStatus};

// --- Strategies ---

/// 2026-01-01T00:00:00Z in milliseconds; everything is generated near it.
const BASE_MS: i64 = 1_767_225_600_000;
const DAY_MS: i64 = 86_400_000;

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![Just(TaskStatus::InProgress), Just(TaskStatus::Completed)]
}

/// An instant or bare date within about two months of `BASE_MS`.
fn arb_moment() -> impl Strategy<Value = Moment> {
    let offset = -40 * DAY_MS..40 * DAY_MS;
    prop_oneof![
        offset
            .clone()
            .prop_filter_map("in range", |d| Moment::from_millis(BASE_MS + d)),
        offset.prop_filter_map("in range", |d| {
            Moment::from_millis(BASE_MS + d).map(|m| Moment::Date(m.date_in(&chrono::Utc)))
        }),
    ]
}

fn arb_task(index: usize) -> impl Strategy<Value = Task> {
    (
        arb_priority(),
        arb_status(),
        proptest::option::of(arb_moment()),
        proptest::option::of(arb_moment()),
        proptest::option::of(arb_moment()),
        proptest::option::of(arb_moment()),
    )
        .prop_map(move |(priority, status, due, created, created_alt, updated)| {
            let mut task = Task::new(format!("t-{index}"), format!("Task {index}"));
            task.priority = priority;
            task.status = status;
            task.due_date = due;
            task.created_at = created;
            task.created_at_alt = created_alt;
            task.updated_at = updated;
            task
        })
}

/// Tasks with distinct ids.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    (0_usize..24).prop_flat_map(|n| (0..n).map(arb_task).collect::<Vec<_>>())
}

fn arb_filters() -> impl Strategy<Value = FilterSet> {
    (
        prop::sample::select(DateFilter::ALL),
        prop::sample::select(PriorityFilter::ALL),
        prop::sample::select(SortOrder::ALL),
    )
        .prop_map(|(date, priority, sort)| FilterSet {
            date,
            priority,
            sort,
        })
}

/// A viewer clock in a zone between UTC-12 and UTC+14.
fn arb_now() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (-12_i32..=14, -20 * DAY_MS..20 * DAY_MS).prop_map(|(hours, d)| {
        let tz = FixedOffset::east_opt(hours * 3600).unwrap();
        tz.timestamp_millis_opt(BASE_MS + d).unwrap()
    })
}

// --- Properties ---

proptest! {
    #[test]
    fn dashboard_only_shows_open_tasks_passing_filters(
        tasks in arb_tasks(),
        filters in arb_filters(),
        now in arb_now(),
    ) {
        let shown = views::dashboard(&tasks, &filters, &now);
        for task in &shown {
            prop_assert!(!task.is_completed());
            prop_assert!(filters.priority.admits(task.priority));
            prop_assert!(matches_date(task, filters.date, &now));
        }
        let expected = tasks
            .iter()
            .filter(|t| !t.is_completed())
            .filter(|t| filters.priority.admits(t.priority))
            .filter(|t| matches_date(t, filters.date, &now))
            .count();
        prop_assert_eq!(shown.len(), expected);
    }

    #[test]
    fn default_filters_show_every_open_task(tasks in arb_tasks(), now in arb_now()) {
        let shown = views::dashboard(&tasks, &FilterSet::default(), &now);
        let open = tasks.iter().filter(|t| !t.is_completed()).count();
        prop_assert_eq!(shown.len(), open);
    }

    #[test]
    fn dashboard_is_sorted_by_key(
        tasks in arb_tasks(),
        filters in arb_filters(),
        now in arb_now(),
    ) {
        let tz = now.timezone();
        let keys: Vec<i64> = views::dashboard(&tasks, &filters, &now)
            .iter()
            .map(|t| sort_key(t, &tz))
            .collect();
        let ordered = match filters.sort {
            SortOrder::Newest => keys.windows(2).all(|w| w[0] >= w[1]),
            SortOrder::Oldest => keys.windows(2).all(|w| w[0] <= w[1]),
        };
        prop_assert!(ordered, "keys out of order: {:?}", keys);
    }

    #[test]
    fn completed_view_is_sorted(
        tasks in arb_tasks(),
        sort in prop::sample::select(CompletedSort::ALL),
        now in arb_now(),
    ) {
        let tz = now.timezone();
        let done = views::completed(&tasks, sort, &tz);
        prop_assert!(done.iter().all(|t| t.is_completed()));
        let ordered = match sort {
            CompletedSort::Newest => done.windows(2).all(|w| sort_key(w[0], &tz) >= sort_key(w[1], &tz)),
            CompletedSort::Oldest => done.windows(2).all(|w| sort_key(w[0], &tz) <= sort_key(w[1], &tz)),
            CompletedSort::Priority => done
                .windows(2)
                .all(|w| w[0].priority.weight() >= w[1].priority.weight()),
        };
        prop_assert!(ordered);
    }

    #[test]
    fn views_partition_the_collection(tasks in arb_tasks(), now in arb_now()) {
        let open = views::dashboard(&tasks, &FilterSet::default(), &now);
        let done = views::completed(&tasks, CompletedSort::Newest, &now.timezone());
        prop_assert_eq!(open.len() + done.len(), tasks.len());
        for task in &open {
            prop_assert!(!done.iter().any(|d| d.id == task.id));
        }
    }

    #[test]
    fn stats_add_up(tasks in arb_tasks()) {
        let stats = TaskStats::from_tasks(&tasks);
        prop_assert_eq!(stats.total, tasks.len());
        prop_assert_eq!(stats.low + stats.medium + stats.high, stats.total);
        prop_assert_eq!(stats.completed + stats.pending, stats.total);
        prop_assert!(stats.completion_percent <= 100);
        if stats.total > 0 && stats.completed == stats.total {
            prop_assert_eq!(stats.completion_percent, 100);
        }
        if stats.completed == 0 {
            prop_assert_eq!(stats.completion_percent, 0);
        }
    }

    #[test]
    fn insights_are_bounded(tasks in arb_tasks(), now in arb_now()) {
        let stats = TaskStats::from_tasks(&tasks);
        let insights = Insights::compute(&tasks, &now);
        prop_assert!(insights.completed_today <= insights.completed_this_week);
        prop_assert!(insights.completed_this_week <= stats.completed);
        prop_assert!(insights.overdue + insights.due_today <= stats.pending);
    }

    #[test]
    fn derivation_is_deterministic(
        tasks in arb_tasks(),
        filters in arb_filters(),
        now in arb_now(),
    ) {
        let first: Vec<_> = views::dashboard(&tasks, &filters, &now)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let second: Vec<_> = views::dashboard(&tasks, &filters, &now)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(
            Insights::compute(&tasks, &now),
            Insights::compute(&tasks, &now)
        );
    }
}
