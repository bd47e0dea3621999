//! Session state: who is signed in and with which credential.
//!
//! A [`Session`] exists only between a successful login/signup and either a
//! logout or an authorization failure. The bearer credential is wiped from
//! memory when the session is dropped and never printed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taskboard_proto::auth::UserRecord;
use zeroize::Zeroizing;

/// Name shown when the server does not provide one.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Avatar service used to derive a picture from a display name.
const AVATAR_BASE: &str = "https://ui-avatars.com/api/";

/// Errors that can occur when persisting or restoring a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to read or write the session file.
    #[error("session file {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The session file exists but is not a valid session.
    #[error("corrupt session file {path}: {reason}")]
    Corrupt {
        /// Path that was read.
        path: PathBuf,
        /// Why it could not be parsed.
        reason: String,
    },
}

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wraps a token issued by the server.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Denormalized identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Avatar picture URL.
    pub avatar_url: String,
}

impl Identity {
    /// Builds an identity, defaulting the name and deriving the avatar.
    #[must_use]
    pub fn new(name: Option<&str>, email: &str) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string();
        Self {
            avatar_url: avatar_url(&name),
            name,
            email: email.to_string(),
        }
    }

    /// Builds an identity from a server user record, falling back to the
    /// email the user typed when the server does not echo one.
    #[must_use]
    pub fn from_record(record: &UserRecord, typed_email: &str) -> Self {
        let email = record.email.as_deref().unwrap_or(typed_email);
        Self::new(record.name.as_deref(), email)
    }
}

/// Avatar URL for a display name.
#[must_use]
pub fn avatar_url(name: &str) -> String {
    url::Url::parse_with_params(AVATAR_BASE, &[("name", name), ("background", "random")])
        .map_or_else(|_| AVATAR_BASE.to_string(), String::from)
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in.
    pub identity: Identity,
    /// Credential sent with every authenticated request.
    pub credential: Credential,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// The user logged out.
    Logout,
    /// The server rejected the credential with this HTTP status.
    AuthFailure {
        /// 401 or 403.
        status: u16,
    },
    /// An authenticated operation was attempted with no session.
    MissingCredential,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logout => f.write_str("logged out"),
            Self::AuthFailure { status } => write!(f, "credential rejected (HTTP {status})"),
            Self::MissingCredential => f.write_str("not signed in"),
        }
    }
}

/// Observable session phase, published to whoever drives re-authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Signed in as this identity.
    SignedIn(Identity),
    /// Signed out; `None` when no session has existed yet.
    SignedOut(Option<TeardownReason>),
}

impl SessionPhase {
    /// Whether the surrounding system must send the user back to login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::SignedOut(Some(
                TeardownReason::AuthFailure { .. } | TeardownReason::MissingCredential
            ))
        )
    }
}

/// On-disk session representation.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    token: Zeroizing<String>,
    user: Identity,
}

/// JSON file holding the session between invocations.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// A session file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<data dir>/taskboard/session.json`.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("taskboard").join("session.json")))
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session. A missing file means no session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be read,
    /// or [`SessionError::Corrupt`] if it does not parse.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => Zeroizing::new(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let persisted: PersistedSession =
            serde_json::from_str(&contents).map_err(|e| SessionError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(Session {
            identity: persisted.user,
            credential: Credential::new(persisted.token.as_str()),
        }))
    }

    /// Writes `session`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the directory or file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let persisted = PersistedSession {
            token: Zeroizing::new(session.credential.expose().to_string()),
            user: session.identity.clone(),
        };
        let json = Zeroizing::new(serde_json::to_string_pretty(&persisted).map_err(|e| {
            SessionError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?);
        std::fs::write(&self.path, json.as_bytes()).map_err(io_err)
    }

    /// Deletes the file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
