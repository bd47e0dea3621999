//! Application context: the task store plus the current session.
//!
//! The session is an explicit value here rather than ambient global state.
//! Signing in and tearing down are the only transitions, and each one is
//! published on a `watch` channel so whoever drives the login screen can
//! react when a request forces re-authentication.

use tokio::sync::watch;

use crate::session::{Credential, Identity, Session, SessionFile, SessionPhase, TeardownReason};
use crate::store::TaskStore;

/// Store, session and session-change notifications for one client.
pub struct AppContext<S: TaskStore> {
    store: S,
    session: Option<Session>,
    session_file: Option<SessionFile>,
    phase: watch::Sender<SessionPhase>,
}

impl<S: TaskStore> AppContext<S> {
    /// A signed-out context with no session persistence.
    pub fn new(store: S) -> Self {
        let (phase, _) = watch::channel(SessionPhase::SignedOut(None));
        Self {
            store,
            session: None,
            session_file: None,
            phase,
        }
    }

    /// Persists the session to `file` on sign-in and deletes it on teardown.
    #[must_use]
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.session_file = Some(file);
        self
    }

    /// Restores a session saved by an earlier run.
    ///
    /// Returns `true` if a session was found. An unreadable or corrupt
    /// file is logged and deleted, leaving the context signed out.
    pub fn restore(&mut self) -> bool {
        let Some(file) = &self.session_file else {
            return false;
        };
        match file.load() {
            Ok(Some(session)) => {
                tracing::debug!(user = %session.identity.email, "restored session");
                self.phase
                    .send_replace(SessionPhase::SignedIn(session.identity.clone()));
                self.session = Some(session);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session file");
                if let Err(e) = file.clear() {
                    tracing::warn!(error = %e, "failed to delete session file");
                }
                false
            }
        }
    }

    /// The task store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The current session, if signed in.
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Who is signed in, if anyone.
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    /// The credential for authenticated requests, if signed in.
    pub fn credential(&self) -> Option<&Credential> {
        self.session.as_ref().map(|s| &s.credential)
    }

    /// The current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    /// Subscribes to session phase changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Starts `session`, replacing any previous one.
    ///
    /// A failure to persist is logged; the in-memory session still holds.
    pub fn sign_in(&mut self, session: Session) {
        tracing::info!(user = %session.identity.email, "signed in");
        if let Some(file) = &self.session_file {
            if let Err(e) = file.save(&session) {
                tracing::warn!(error = %e, "failed to persist session");
            }
        }
        self.phase
            .send_replace(SessionPhase::SignedIn(session.identity.clone()));
        self.session = Some(session);
    }

    /// Ends the session. The credential is wiped and the session file removed.
    pub fn teardown(&mut self, reason: TeardownReason) {
        let previous = self.session.take();
        match reason {
            TeardownReason::Logout => tracing::info!(%reason, "session ended"),
            TeardownReason::AuthFailure { .. } | TeardownReason::MissingCredential => {
                tracing::warn!(
                    %reason,
                    had_session = previous.is_some(),
                    "session torn down, re-authentication required"
                );
            }
        }
        drop(previous);
        if let Some(file) = &self.session_file {
            if let Err(e) = file.clear() {
                tracing::warn!(error = %e, "failed to delete session file");
            }
        }
        self.phase.send_replace(SessionPhase::SignedOut(Some(reason)));
    }
}
