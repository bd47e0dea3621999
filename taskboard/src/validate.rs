//! Local checks run before a task is sent to the server.

use chrono::{DateTime, NaiveDate, TimeZone};
use taskboard_proto::task::TaskDraft;

/// A draft the server should never see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The title is empty.
    #[error("task title cannot be empty")]
    TitleEmpty,

    /// The due date is before today.
    #[error("Due date cannot be in the past.")]
    DueDateInPast {
        /// Requested due date.
        due: NaiveDate,
        /// Today in the viewer's time zone.
        today: NaiveDate,
    },
}

/// Checks a draft against the viewer's clock.
///
/// Due dates are compared as calendar dates in `now`'s time zone, so a task
/// due today is accepted at any time of day.
///
/// # Errors
///
/// Returns the first rule the draft breaks.
pub fn validate_draft<Tz: TimeZone>(
    draft: &TaskDraft,
    now: &DateTime<Tz>,
) -> Result<(), ValidationError> {
    if draft.title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if let Some(due) = draft.due_date {
        let tz = now.timezone();
        let due = due.date_in(&tz);
        let today = now.date_naive();
        if due < today {
            return Err(ValidationError::DueDateInPast { due, today });
        }
    }
    Ok(())
}
