//! View Derivation Engine.
//!
//! Pure functions from the cached tasks, the user's filter choices and the
//! viewer's clock to what should be shown. Nothing here touches the network
//! or mutates its input.

pub mod derive;
pub mod display;
pub mod filters;
pub mod stats;

pub use derive::{completed, dashboard, sort_key};
pub use filters::{CompletedSort, DateFilter, FilterParseError, FilterSet, PriorityFilter, SortOrder};
pub use stats::{Insights, TaskStats};
