//! Task records exchanged with the task API.
//!
//! The server owns every task. The client caches what `GET /api/tasks`
//! returns and sends back either a [`TaskDraft`] (create), a full [`Task`]
//! (update) or a [`StatusUpdate`] (status toggle).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::CodecError;
use crate::moment::{self, Moment};

/// Opaque server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a server-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Task priority.
///
/// Parsed case-insensitively, always written upper-case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Lowest priority; the default for new tasks.
    #[default]
    Low,
    /// Medium priority.
    Medium,
    /// Highest priority.
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Fixed ranking weight used when sorting by priority.
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(CodecError::UnknownPriority(s.to_string())),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Task status. A task is either being worked on or done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not finished yet; the default for new tasks.
    #[default]
    InProgress,
    /// Finished.
    Completed,
}

impl TaskStatus {
    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::InProgress => Self::Completed,
            Self::Completed => Self::InProgress,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A checklist item inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Checklist item text.
    pub title: String,
    /// Whether the item is ticked.
    #[serde(default)]
    pub completed: bool,
}

/// A task as stored by the server.
///
/// Decoded through [`TaskRecord`], which tolerates the field variants
/// different deployments send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Moment>,
    /// Task priority.
    pub priority: Priority,
    /// Task status.
    pub status: TaskStatus,
    /// Creation timestamp assigned by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Moment>,
    /// Creation timestamp under its snake-case key. Read-only fallback.
    #[serde(skip_serializing)]
    pub created_at_alt: Option<Moment>,
    /// Last-modified timestamp assigned by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Moment>,
    /// Ordered checklist.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

/// A task exactly as it arrives on the wire.
///
/// Mongo-style backends send `_id`, often next to `id`; either one names
/// the task and `_id` wins when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(default)]
    id: Option<TaskId>,
    #[serde(rename = "_id", default)]
    object_id: Option<TaskId>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "moment::lenient")]
    due_date: Option<Moment>,
    #[serde(default, deserialize_with = "lenient_priority")]
    priority: Priority,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default, deserialize_with = "moment::lenient")]
    created_at: Option<Moment>,
    #[serde(rename = "created_at", default, deserialize_with = "moment::lenient")]
    created_at_alt: Option<Moment>,
    #[serde(default, deserialize_with = "moment::lenient")]
    updated_at: Option<Moment>,
    #[serde(default)]
    subtasks: Vec<Subtask>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = CodecError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let id = record
            .object_id
            .filter(|id| !id.as_str().is_empty())
            .or(record.id)
            .filter(|id| !id.as_str().is_empty())
            .ok_or(CodecError::MissingTaskId)?;
        Ok(Self {
            id,
            title: record.title,
            description: record.description,
            due_date: record.due_date,
            priority: record.priority,
            status: record.status,
            created_at: record.created_at,
            created_at_alt: record.created_at_alt,
            updated_at: record.updated_at,
            subtasks: record.subtasks,
        })
    }
}

/// Whatever a priority field happened to contain.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPriority {
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// `null`, unknown names and non-string values read as the default
/// priority; the task itself is kept.
fn lenient_priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
    let raw = Option::<RawPriority>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPriority::Text(s)) => s.parse().unwrap_or_default(),
        Some(RawPriority::Other(_)) | None => Priority::default(),
    })
}

impl Task {
    /// Creates a task with only the required fields set.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::default(),
            status: TaskStatus::default(),
            created_at: None,
            created_at_alt: None,
            updated_at: None,
            subtasks: Vec::new(),
        }
    }

    /// Whether the task is done.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Fraction of subtasks ticked, in `0.0..=1.0`. Zero when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn subtask_completion(&self) -> f64 {
        if self.subtasks.is_empty() {
            return 0.0;
        }
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        done as f64 / self.subtasks.len() as f64
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The client-editable part of a task. Sent as the body of a create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date.
    #[serde(
        default,
        deserialize_with = "moment::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Moment>,
    /// Task priority.
    #[serde(default)]
    pub priority: Priority,
    /// Task status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Ordered checklist.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl TaskDraft {
    /// Returns a copy of `task` with the editable fields replaced by this draft.
    ///
    /// Identity and server timestamps are kept from `task`.
    #[must_use]
    pub fn apply_to(&self, task: &Task) -> Task {
        Task {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            subtasks: self.subtasks.clone(),
            ..task.clone()
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            subtasks: task.subtasks.clone(),
        }
    }
}

/// Body of `PUT /api/tasks/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// The requested status.
    pub status: TaskStatus,
}
