//! Per-entity optimistic update state.
//!
//! ```text
//! Stable(v) --propose(o)--> Pending { optimistic: o, confirmed: v }
//! Pending   --confirm(s)--> Stable(s)
//! Pending   --reject()----> Reverting { confirmed: v } --settle()--> Stable(v)
//! ```
//!
//! The visible value is the optimistic one only while a request is pending.

/// Optimistic state of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimistic<T> {
    /// The value agrees with the server.
    Stable(T),
    /// A change has been shown locally and sent; the server has not answered.
    Pending {
        /// Value shown while the request is in flight.
        optimistic: T,
        /// Last value the server confirmed.
        confirmed: T,
    },
    /// The server refused the change; the confirmed value is being restored.
    Reverting {
        /// Value to restore.
        confirmed: T,
    },
}

impl<T: Copy> Optimistic<T> {
    /// The value a viewer should see right now.
    pub fn visible(&self) -> T {
        match *self {
            Self::Stable(v) | Self::Reverting { confirmed: v } => v,
            Self::Pending { optimistic, .. } => optimistic,
        }
    }

    /// The last server-confirmed value.
    pub fn confirmed(&self) -> T {
        match *self {
            Self::Stable(v) | Self::Pending { confirmed: v, .. } | Self::Reverting { confirmed: v } => v,
        }
    }

    /// Whether a request is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Shows `optimistic` while keeping the confirmed value for rollback.
    ///
    /// Returns `None` if a change is already pending.
    #[must_use]
    pub fn propose(self, optimistic: T) -> Option<Self> {
        match self {
            Self::Pending { .. } => None,
            Self::Stable(confirmed) | Self::Reverting { confirmed } => Some(Self::Pending {
                optimistic,
                confirmed,
            }),
        }
    }

    /// The server accepted the change and reports `server` as the new value.
    #[must_use]
    pub fn confirm(self, server: T) -> Self {
        Self::Stable(server)
    }

    /// The server refused the change.
    #[must_use]
    pub fn reject(self) -> Self {
        Self::Reverting {
            confirmed: self.confirmed(),
        }
    }

    /// Finishes a revert.
    #[must_use]
    pub fn settle(self) -> Self {
        match self {
            Self::Reverting { confirmed } => Self::Stable(confirmed),
            other => other,
        }
    }

    /// A fresh server value arrived while a change may still be pending.
    ///
    /// The pending guess stays visible; the new value becomes the rollback
    /// target.
    #[must_use]
    pub fn rebase(self, server: T) -> Self {
        match self {
            Self::Pending { optimistic, .. } => Self::Pending {
                optimistic,
                confirmed: server,
            },
            Self::Stable(_) | Self::Reverting { .. } => Self::Stable(server),
        }
    }
}
