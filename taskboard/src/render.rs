//! Plain-text rendering of views for the command line.

use chrono::{DateTime, TimeZone};
use taskboard_proto::task::Task;

use crate::session::Identity;
use crate::views::display::{
    EMPTY_COMPLETED, created_label, description_preview, due_label, empty_dashboard_message,
    subtask_percent,
};
use crate::views::{FilterSet, Insights, TaskStats};

/// One task as a short block: a status line and an optional preview line.
pub fn task_block<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> String {
    let mark = if task.is_completed() { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{mark} {:<6} {}  ({})\n    {} | {}",
        task.priority.as_str(),
        task.title,
        task.id,
        due_label(task, now),
        created_label(task, &now.timezone()),
    );
    if !task.subtasks.is_empty() {
        let done = task.subtasks.iter().filter(|s| s.completed).count();
        line.push_str(&format!(
            " | {done}/{} subtasks ({}%)",
            task.subtasks.len(),
            subtask_percent(task)
        ));
    }
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str("\n    ");
        line.push_str(&description_preview(description));
    }
    line
}

/// The dashboard list, or its empty-state message.
pub fn dashboard<Tz: TimeZone>(tasks: &[&Task], filters: &FilterSet, now: &DateTime<Tz>) -> String {
    if tasks.is_empty() {
        return empty_dashboard_message(filters).to_string();
    }
    let header = format!(
        "{} open task(s) | date: {} | priority: {} | sort: {}",
        tasks.len(),
        filters.date,
        filters.priority,
        filters.sort
    );
    blocks(header, tasks, now)
}

/// The completed list, or its empty-state message.
pub fn completed<Tz: TimeZone>(tasks: &[&Task], now: &DateTime<Tz>) -> String {
    if tasks.is_empty() {
        return EMPTY_COMPLETED.to_string();
    }
    blocks(format!("{} completed task(s)", tasks.len()), tasks, now)
}

fn blocks<Tz: TimeZone>(header: String, tasks: &[&Task], now: &DateTime<Tz>) -> String {
    let mut out = header;
    for task in tasks {
        out.push('\n');
        out.push_str(&task_block(task, now));
    }
    out
}

/// Counts and insights.
#[must_use]
pub fn stats(stats: &TaskStats, insights: &Insights) -> String {
    format!(
        "Total: {}  Completed: {}  Pending: {}  ({}% done)\n\
         Priority: HIGH {}  MEDIUM {}  LOW {}\n\
         Completed today: {}  this week: {}\n\
         Overdue: {}  Due today: {}",
        stats.total,
        stats.completed,
        stats.pending,
        stats.completion_percent,
        stats.high,
        stats.medium,
        stats.low,
        insights.completed_today,
        insights.completed_this_week,
        insights.overdue,
        insights.due_today,
    )
}

/// The signed-in user.
#[must_use]
pub fn identity(identity: &Identity) -> String {
    format!("{} <{}>\n{}", identity.name, identity.email, identity.avatar_url)
}
