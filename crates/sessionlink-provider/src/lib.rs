//! Identity provider bridge for sessionlink.
//!
//! Provides the [`IdentityProvider`] trait: the thin contract the session
//! controller needs from an external OpenID-Connect-style provider.
//!
//! 1. **Where to send the user**: [`IdentityProvider::authorization_url`]
//! 2. **Whether it worked**: [`IdentityProvider::exchange_credential_for_token`]
//! 3. **When to check**: [`IdentityProvider::completion_events`]
//!
//! # Feature Flags
//!
//! - `oidc` (default): [`OidcProvider`], an authorization-code provider
//!   (with PKCE) that talks to a token endpoint via `reqwest`.

#![allow(async_fn_in_trait)]

mod error;
mod events;
#[cfg(feature = "oidc")]
mod oidc;
#[cfg(feature = "oidc")]
mod pkce;

pub use error::ProviderError;
pub use events::CompletionEvents;
#[cfg(feature = "oidc")]
pub use oidc::{Credentials, OidcProvider, ProviderConfig, TokenResponse};
#[cfg(feature = "oidc")]
pub use pkce::PkceChallenge;
pub use reqwest::Url;

use std::sync::Arc;

use sessionlink_protocol::{AccessToken, CompletionSignal};
use tokio::sync::broadcast;

/// The session controller's view of an identity provider.
///
/// `Send + Sync + 'static` because the controller calls it from a
/// background task for as long as the application runs.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The address to present to the user to begin login.
    ///
    /// Returns `None` when the provider is misconfigured. Never panics.
    fn authorization_url(&self) -> Option<Url>;

    /// Trades the locally cached credential for a bearer token.
    ///
    /// # Errors
    /// [`ProviderError::CredentialUnavailable`] when there's no valid
    /// credential: login never finished, was cancelled, or expired.
    fn exchange_credential_for_token(
        &self,
    ) -> impl Future<Output = Result<AccessToken, ProviderError>> + Send;

    /// Subscribes to "login UI finished" signals fired from now on.
    fn completion_events(&self) -> broadcast::Receiver<CompletionSignal>;

    /// Forgets any cached credential. Called on sign-out.
    ///
    /// Providers that keep nothing locally can leave this as a no-op.
    fn clear_credentials(&self) {}
}

/// Lets the composition root share one provider between the controller
/// and the host (which needs it to deliver redirects).
impl<P: IdentityProvider> IdentityProvider for Arc<P> {
    fn authorization_url(&self) -> Option<Url> {
        (**self).authorization_url()
    }

    fn exchange_credential_for_token(
        &self,
    ) -> impl Future<Output = Result<AccessToken, ProviderError>> + Send {
        (**self).exchange_credential_for_token()
    }

    fn completion_events(&self) -> broadcast::Receiver<CompletionSignal> {
        (**self).completion_events()
    }

    fn clear_credentials(&self) {
        (**self).clear_credentials();
    }
}
