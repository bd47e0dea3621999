//! Aggregates over the whole (unfiltered) task collection.

use chrono::{DateTime, TimeZone};
use taskboard_proto::task::{Priority, Task};

use super::derive::{midnight, shift_days};

/// Counts shown on the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Every task.
    pub total: usize,
    /// LOW tasks.
    pub low: usize,
    /// MEDIUM tasks.
    pub medium: usize,
    /// HIGH tasks.
    pub high: usize,
    /// Completed tasks.
    pub completed: usize,
    /// `total - completed`.
    pub pending: usize,
    /// `completed / total` as a rounded percentage; 0 when there are no tasks.
    pub completion_percent: usize,
}

impl TaskStats {
    /// Counts `tasks`.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.priority {
                Priority::Low => stats.low += 1,
                Priority::Medium => stats.medium += 1,
                Priority::High => stats.high += 1,
            }
            if task.is_completed() {
                stats.completed += 1;
            }
        }
        stats.pending = stats.total - stats.completed;
        stats.completion_percent = completion_percent(stats.completed, stats.total);
        stats
    }
}

/// `round(completed / total * 100)`, halves rounding up.
#[must_use]
pub const fn completion_percent(completed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (200 * completed + total) / (2 * total)
}

/// Productivity figures relative to the viewer's day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insights {
    /// Completed tasks last updated since local midnight.
    pub completed_today: usize,
    /// Completed tasks last updated since local midnight seven days ago.
    pub completed_this_week: usize,
    /// Incomplete tasks due before today.
    pub overdue: usize,
    /// Incomplete tasks due today.
    pub due_today: usize,
}

impl Insights {
    /// Computes insights for `tasks` as seen at `now`.
    pub fn compute<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let day_start = midnight(today, &tz);
        let week_start = midnight(shift_days(today, -7), &tz);

        let mut insights = Self::default();
        for task in tasks {
            if task.is_completed() {
                if let Some(updated) = task.updated_at.map(|m| m.in_zone(&tz)) {
                    if updated >= day_start {
                        insights.completed_today += 1;
                    }
                    if updated >= week_start {
                        insights.completed_this_week += 1;
                    }
                }
            } else if let Some(due) = task.due_date {
                if due.in_zone(&tz) < day_start {
                    insights.overdue += 1;
                } else if due.date_in(&tz) == today {
                    insights.due_today += 1;
                }
            }
        }
        insights
    }
}
