//! Labels and short texts derived from tasks for display.

use chrono::{DateTime, TimeZone};
use taskboard_proto::task::Task;

use super::filters::FilterSet;

/// Number of description words shown before truncating.
pub const PREVIEW_WORDS: usize = 29;

/// Empty dashboard with default filters.
pub const EMPTY_DASHBOARD: &str = "Create tasks to start the day!";

/// Empty dashboard with active filters.
pub const EMPTY_FILTERED: &str = "No tasks match the current filters";

/// Empty completed view.
pub const EMPTY_COMPLETED: &str = "No completed tasks yet!";

/// Subtask completion as a whole percentage.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn subtask_percent(task: &Task) -> u8 {
    (task.subtask_completion() * 100.0).round() as u8
}

/// `"Due Today"`, `"Due Oct 20"` or `"No due date"`.
pub fn due_label<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> String {
    let tz = now.timezone();
    match task.due_date {
        None => "No due date".to_string(),
        Some(due) if due.date_in(&tz) == now.date_naive() => "Due Today".to_string(),
        Some(due) => format!("Due {}", due.date_in(&tz).format("%b %d")),
    }
}

/// `"Created Oct 01"` or `"No date"`.
pub fn created_label<Tz: TimeZone>(task: &Task, tz: &Tz) -> String {
    task.created_at
        .or(task.created_at_alt)
        .map_or_else(
            || "No date".to_string(),
            |m| format!("Created {}", m.date_in(tz).format("%b %d")),
        )
}

/// Description cut to [`PREVIEW_WORDS`] space-separated words plus `...`.
///
/// Shorter descriptions are returned unchanged.
#[must_use]
pub fn description_preview(description: &str) -> String {
    let words: Vec<&str> = description.split(' ').collect();
    if words.len() <= PREVIEW_WORDS {
        return description.to_string();
    }
    format!("{}...", words[..PREVIEW_WORDS].join(" "))
}

/// Message for an empty dashboard.
#[must_use]
pub fn empty_dashboard_message(filters: &FilterSet) -> &'static str {
    if filters.is_default() {
        EMPTY_DASHBOARD
    } else {
        EMPTY_FILTERED
    }
}
