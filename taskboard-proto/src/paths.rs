//! Endpoint paths of the task API, relative to its base URL.

use crate::task::TaskId;

/// `POST` credentials, receive a token.
pub const LOGIN: &str = "/api/auth/login";

/// `POST` a new account.
pub const SIGNUP: &str = "/api/auth/signup";

/// `GET` the task list, `POST` a new task.
pub const TASKS: &str = "/api/tasks";

/// `PUT` or `DELETE` a single task.
#[must_use]
pub fn task(id: &TaskId) -> String {
    format!("{TASKS}/{id}")
}

/// `PUT` a task's status.
#[must_use]
pub fn task_status(id: &TaskId) -> String {
    format!("{TASKS}/{id}/status")
}
