//! User backend client for sessionlink.
//!
//! The session controller doesn't know how the application's user
//! directory is reached. It only needs the [`UserBackend`] trait: hand it a
//! bearer token, ask it who that token belongs to.
//!
//! # Why a trait?
//!
//! - [`HttpUserBackend`] in production
//! - an in-memory fake in tests
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpUserBackend`] via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::BackendError;
#[cfg(feature = "http")]
pub use http::{BackendConfig, HttpUserBackend};

use std::sync::Arc;

use sessionlink_protocol::{AccessToken, User};

/// Authenticates bearer tokens against the application's user directory.
///
/// Implementations must not touch any state besides their own token slot:
/// deciding what a successful or failed call means is the session
/// controller's job.
pub trait UserBackend: Send + Sync + 'static {
    /// Attaches `token` to every later [`authenticate`](Self::authenticate)
    /// call. Last write wins; providing the same token twice is harmless.
    fn provide_token(&self, token: AccessToken);

    /// One round trip to the backend with the most recently provided token.
    ///
    /// # Errors
    /// - [`BackendError::MissingToken`]: no token was provided yet
    /// - [`BackendError::Unauthorized`]: the backend rejected the token
    /// - transport failures and [`BackendError::Decoding`]
    fn authenticate(&self) -> impl Future<Output = Result<User, BackendError>> + Send;

    /// Forgets the provided token. Called on sign-out.
    fn clear_token(&self);
}

impl<B: UserBackend> UserBackend for Arc<B> {
    fn provide_token(&self, token: AccessToken) {
        (**self).provide_token(token);
    }

    fn authenticate(&self) -> impl Future<Output = Result<User, BackendError>> + Send {
        (**self).authenticate()
    }

    fn clear_token(&self) {
        (**self).clear_token();
    }
}
