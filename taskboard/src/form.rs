//! The task editing surface.
//!
//! A [`TaskForm`] holds a draft while the user fills it in. It knows whether
//! it is creating a new task or editing an existing one, and carries the
//! inline error from the last failed save. Saving itself goes through
//! [`Coordinator::save_form`](crate::coordinator::Coordinator::save_form).

use chrono::TimeZone;
use taskboard_proto::moment::Moment;
use taskboard_proto::task::{Task, TaskDraft, TaskId};

/// Inline error when a save fails without a server message.
pub const SAVE_FAILED: &str = "Failed to save task";

/// What saving the form will send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Create a new task from this draft.
    Create(TaskDraft),
    /// Replace an existing task with this record.
    Update(Task),
}

/// Create/edit form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    draft: TaskDraft,
    editing: Option<Task>,
    open: bool,
    error: Option<String>,
}

impl TaskForm {
    /// A closed, empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the form for a new task with default values.
    pub fn open_new(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    /// Opens the form pre-filled from `task`.
    ///
    /// The due date is reduced to its calendar date in `tz`.
    pub fn open_edit<Tz: TimeZone>(&mut self, task: &Task, tz: &Tz) {
        let mut draft = TaskDraft::from(task);
        draft.due_date = task.due_date.map(|m| Moment::Date(m.date_in(tz)));
        *self = Self {
            draft,
            editing: Some(task.clone()),
            open: true,
            error: None,
        };
    }

    /// Closes and resets the form.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Whether the form is showing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// The values entered so far.
    #[must_use]
    pub const fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// Mutable access to the entered values. Clears any inline error.
    pub fn draft_mut(&mut self) -> &mut TaskDraft {
        self.error = None;
        &mut self.draft
    }

    /// Id of the task being edited, if any.
    #[must_use]
    pub fn editing_id(&self) -> Option<&TaskId> {
        self.editing.as_ref().map(|t| &t.id)
    }

    /// Inline error from the last failed save.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows `message` inline.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// What a save would send right now.
    #[must_use]
    pub fn submission(&self) -> Submission {
        match &self.editing {
            Some(task) => Submission::Update(self.draft.apply_to(task)),
            None => Submission::Create(self.draft.clone()),
        }
    }
}
