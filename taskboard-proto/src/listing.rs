//! Normalization of `GET /api/tasks` responses.
//!
//! Deployments of the task API disagree on how the list is delivered:
//!
//! | Shape | Body |
//! |---|---|
//! | [`ListingShape::Bare`] | `[ {task}, ... ]` |
//! | [`ListingShape::Tasks`] | `{ "tasks": [ {task}, ... ] }` |
//! | [`ListingShape::Data`] | `{ "data": [ {task}, ... ] }` |
//!
//! Checked in that order. Any other JSON value is
//! [`ListingShape::Unrecognized`] and yields an empty list rather than an
//! error. Array elements that do not decode as a [`Task`] are skipped and
//! counted.

use serde_json::Value;

use crate::codec::{self, CodecError};
use crate::task::Task;

/// How a task list response was shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingShape {
    /// A bare JSON array.
    Bare,
    /// An object with the array under `tasks`.
    Tasks,
    /// An object with the array under `data`.
    Data,
    /// Anything else.
    Unrecognized,
}

impl ListingShape {
    /// Wraps `tasks` in this shape. `Unrecognized` produces an empty object.
    #[must_use]
    pub fn wrap(self, tasks: &[Task]) -> Value {
        let items = Value::Array(
            tasks
                .iter()
                .filter_map(|t| serde_json::to_value(t).ok())
                .collect(),
        );
        match self {
            Self::Bare => items,
            Self::Tasks => serde_json::json!({ "tasks": items }),
            Self::Data => serde_json::json!({ "data": items }),
            Self::Unrecognized => serde_json::json!({}),
        }
    }
}

/// A normalized task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Which shape the response had.
    pub shape: ListingShape,
    /// Tasks that decoded successfully, in response order.
    pub tasks: Vec<Task>,
    /// Number of array elements that were not valid tasks.
    pub skipped: usize,
}

impl Listing {
    fn from_items(shape: ListingShape, items: Vec<Value>) -> Self {
        let total = items.len();
        let tasks: Vec<Task> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        Self {
            shape,
            skipped: total - tasks.len(),
            tasks,
        }
    }

    const fn unrecognized() -> Self {
        Self {
            shape: ListingShape::Unrecognized,
            tasks: Vec::new(),
            skipped: 0,
        }
    }
}

/// Normalizes an already-parsed response body.
#[must_use]
pub fn normalize(value: Value) -> Listing {
    match value {
        Value::Array(items) => Listing::from_items(ListingShape::Bare, items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("tasks") {
                return Listing::from_items(ListingShape::Tasks, items);
            }
            if let Some(Value::Array(items)) = map.remove("data") {
                return Listing::from_items(ListingShape::Data, items);
            }
            Listing::unrecognized()
        }
        _ => Listing::unrecognized(),
    }
}

/// Decodes and normalizes a raw response body.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the body is not JSON at all.
pub fn decode_listing(bytes: &[u8]) -> Result<Listing, CodecError> {
    codec::decode::<Value>(bytes).map(normalize)
}
