//! User-selected filter and sort parameters.

use std::fmt;
use std::str::FromStr;

use taskboard_proto::task::Priority;

/// A filter or sort name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?} (expected one of: {})", .expected.join(", "))]
pub struct FilterParseError {
    /// Which parameter was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Accepted names.
    pub expected: &'static [&'static str],
}

/// Generates `as_str`, `Display` and case-insensitive `FromStr` for a
/// fieldless parameter enum.
macro_rules! named_param {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every value, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Lower-case name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = FilterParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(FilterParseError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: &[$($name),+],
                    }),
                }
            }
        }
    };
}

/// Due-date window for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateFilter {
    /// No date restriction.
    #[default]
    All,
    /// Due today.
    Today,
    /// Due tomorrow.
    Tomorrow,
    /// Due between today and the end of the seventh day from now.
    Week,
    /// Due in the current calendar month.
    Month,
}

named_param!(DateFilter, "date filter", {
    All => "all",
    Today => "today",
    Tomorrow => "tomorrow",
    Week => "week",
    Month => "month",
});

/// Priority restriction for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PriorityFilter {
    /// Any priority.
    #[default]
    All,
    /// Only LOW.
    Low,
    /// Only MEDIUM.
    Medium,
    /// Only HIGH.
    High,
}

named_param!(PriorityFilter, "priority filter", {
    All => "all",
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl PriorityFilter {
    /// Whether a task of `priority` passes.
    #[must_use]
    pub fn admits(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Low => priority == Priority::Low,
            Self::Medium => priority == Priority::Medium,
            Self::High => priority == Priority::High,
        }
    }
}

/// Dashboard ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

named_param!(SortOrder, "sort order", {
    Newest => "newest",
    Oldest => "oldest",
});

/// Completed-view ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompletedSort {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// HIGH, then MEDIUM, then LOW.
    Priority,
}

named_param!(CompletedSort, "completed sort", {
    Newest => "newest",
    Oldest => "oldest",
    Priority => "priority",
});

/// The dashboard's filter controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FilterSet {
    /// Due-date window.
    pub date: DateFilter,
    /// Priority restriction.
    pub priority: PriorityFilter,
    /// Ordering.
    pub sort: SortOrder,
}

impl FilterSet {
    /// Whether every control is at its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Puts every control back to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
