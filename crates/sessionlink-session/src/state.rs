//! Session state types: what subscribers see.
//!
//! Two views of the same transitions:
//! - [`SessionState`]: the current value, always readable, latest wins.
//! - [`SessionEvent`]: every transition, in order, for consumers that
//!   must not miss an intermediate step.

use sessionlink_protocol::User;

use crate::LoginError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many [`SessionEvent`]s a slow `events()` subscriber may fall
    /// behind before it starts losing the oldest ones.
    ///
    /// Default: 64.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { event_capacity: 64 }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The controller's current view of who is logged in.
///
/// ```text
///              request_login / completion signal
///   NoUser ───────────────────────────────→ Authenticating
///     ↑                                       │        │
///     │ sign_out                       ok     │        │ err
///     │                                       ▼        ▼
///     └──────────────── Authenticated(User)   Failed(LoginError)
///                              │                   │
///                              └── next attempt ───┴──→ Authenticating
/// ```
///
/// A user and an error are never current together: entering `Failed`
/// drops the previously held user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is logged in and nothing has failed.
    #[default]
    NoUser,

    /// An attempt is in flight.
    Authenticating,

    /// The backend confirmed this user.
    Authenticated(User),

    /// The last attempt failed. Not terminal: a new attempt may follow.
    Failed(LoginError),
}

impl SessionState {
    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// The last attempt's error, if it failed.
    pub fn error(&self) -> Option<&LoginError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// `true` unless an attempt is in flight.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Authenticating)
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// One state transition, as broadcast by
/// [`SessionController::events`](crate::SessionController::events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An attempt started.
    Authenticating,
    /// An attempt succeeded.
    SignedIn(User),
    /// An attempt failed.
    Failed(LoginError),
    /// The session was cleared by `sign_out`.
    SignedOut,
}

impl SessionEvent {
    /// `true` for events that end an attempt.
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::SignedIn(_) | Self::Failed(_))
    }
}
