//! Task Collection Cache: the session's single source of truth for tasks.
//!
//! The cache changes in only two ways:
//!
//! 1. A completed, non-cancelled load replaces the whole collection.
//! 2. An optimistic status toggle flips one entry and is later confirmed
//!    or reverted.
//!
//! Loads are ticketed. Starting a load cancels the one before it, and only
//! the newest uncancelled ticket may write, so two loads never interleave.

use std::collections::{HashMap, HashSet};

use taskboard_proto::task::{Task, TaskId, TaskStatus};
use tokio_util::sync::CancellationToken;

use crate::optimistic::Optimistic;

/// Errors from cache operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// No cached task has this id.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// A status change for this task has not settled yet.
    #[error("status change already in flight for task {0}")]
    ToggleInFlight(TaskId),
}

/// Permission to write the result of one load into the cache.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl LoadTicket {
    /// Monotonically increasing load number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Token cancelled when this load is superseded or torn down.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether this load has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What happened to a load's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cache now holds the loaded tasks.
    Applied {
        /// Tasks now cached.
        count: usize,
        /// Entries dropped because their id was already seen.
        duplicates: usize,
    },
    /// A newer load was started; the result was dropped.
    Superseded,
    /// The load was cancelled; the result was dropped.
    Cancelled,
}

/// An optimistic status change awaiting the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTicket {
    /// Task being changed.
    pub id: TaskId,
    /// Status before the change.
    pub from: TaskStatus,
    /// Status requested (and shown meanwhile).
    pub to: TaskStatus,
}

/// In-memory task collection for one session.
#[derive(Debug, Default)]
pub struct TaskCache {
    tasks: Vec<Task>,
    statuses: HashMap<TaskId, Optimistic<TaskStatus>>,
    generation: u64,
    in_flight: Option<LoadTicket>,
    loaded: bool,
}

impl TaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tasks in server order, with any pending toggle applied.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a cached task.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Whether any load has been applied since the last clear.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether a load is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Optimistic state of a task's status, if a toggle is unsettled.
    #[must_use]
    pub fn status_state(&self, id: &TaskId) -> Option<Optimistic<TaskStatus>> {
        self.statuses.get(id).copied()
    }

    // -----------------------------------------------------------------------
    // Loads
    // -----------------------------------------------------------------------

    /// Starts a load, cancelling any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(generation = previous.generation, "superseding task load");
            previous.cancel.cancel();
        }
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            cancel: CancellationToken::new(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Applies a load's result if `ticket` is still current.
    ///
    /// The whole collection is replaced. Duplicate ids keep their first
    /// occurrence. Unsettled toggles stay visible on top of the new data.
    pub fn finish_load(&mut self, ticket: &LoadTicket, tasks: Vec<Task>) -> LoadOutcome {
        if ticket.is_cancelled() {
            tracing::debug!(generation = ticket.generation, "discarding cancelled task load");
            return LoadOutcome::Cancelled;
        }
        if ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding superseded task load"
            );
            return LoadOutcome::Superseded;
        }

        let received = tasks.len();
        let mut seen = HashSet::with_capacity(received);
        let mut fresh: Vec<Task> = tasks
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        let duplicates = received - fresh.len();
        if duplicates > 0 {
            tracing::warn!(duplicates, "task listing contained duplicate ids");
        }

        // A toggle on a task the server no longer lists has nothing to settle.
        self.statuses.retain(|id, _| seen.contains(id));
        for task in &mut fresh {
            if let Some(state) = self.statuses.get_mut(&task.id) {
                *state = state.rebase(task.status);
                task.status = state.visible();
            }
        }

        self.tasks = fresh;
        self.loaded = true;
        self.in_flight = None;
        LoadOutcome::Applied {
            count: self.tasks.len(),
            duplicates,
        }
    }

    /// Marks a failed load as finished without touching the tasks.
    pub fn abandon_load(&mut self, ticket: &LoadTicket) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|t| t.generation == ticket.generation)
        {
            self.in_flight = None;
        }
    }

    /// Cancels the load in flight, if any.
    pub fn cancel_load(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            ticket.cancel.cancel();
        }
    }

    /// Drops everything. Used on session teardown.
    pub fn clear(&mut self) {
        self.cancel_load();
        self.tasks.clear();
        self.statuses.clear();
        self.loaded = false;
    }

    // -----------------------------------------------------------------------
    // Optimistic status toggles
    // -----------------------------------------------------------------------

    /// Flips a task's status locally before the server has answered.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownTask`] if the task is not cached, or
    /// [`CacheError::ToggleInFlight`] if an earlier toggle has not settled.
    pub fn begin_toggle(&mut self, id: &TaskId) -> Result<ToggleTicket, CacheError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| CacheError::UnknownTask(id.clone()))?;

        let current = self
            .statuses
            .get(id)
            .copied()
            .unwrap_or(Optimistic::Stable(task.status));
        let from = current.visible();
        let to = from.toggled();
        let pending = current
            .propose(to)
            .ok_or_else(|| CacheError::ToggleInFlight(id.clone()))?;

        task.status = pending.visible();
        self.statuses.insert(id.clone(), pending);
        tracing::debug!(task_id = %id, %from, %to, "optimistic status change");
        Ok(ToggleTicket {
            id: id.clone(),
            from,
            to,
        })
    }

    /// The server accepted the toggle and reports `server` as the status.
    pub fn confirm_toggle(&mut self, ticket: &ToggleTicket, server: TaskStatus) {
        let Some(state) = self.statuses.remove(&ticket.id) else {
            return;
        };
        let settled = state.confirm(server);
        self.set_status(&ticket.id, settled.visible());
    }

    /// The server refused the toggle; restores the last confirmed status.
    ///
    /// Returns the restored status, or `None` if the toggle was unknown.
    pub fn revert_toggle(&mut self, ticket: &ToggleTicket) -> Option<TaskStatus> {
        let state = self.statuses.remove(&ticket.id)?.reject();
        self.set_status(&ticket.id, state.visible());
        let restored = state.settle().visible();
        tracing::debug!(task_id = %ticket.id, status = %restored, "reverted status change");
        Some(restored)
    }

    fn set_status(&mut self, id: &TaskId, status: TaskStatus) {
        if let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) {
            task.status = status;
        }
    }
}
