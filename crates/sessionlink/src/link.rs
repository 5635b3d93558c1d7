//! `SessionLink` builder and handle.
//!
//! This is the entry point for applications. It ties together all the
//! layers: provider → controller ← backend.

use std::sync::Arc;

use sessionlink_backend::{BackendConfig, HttpUserBackend};
use sessionlink_protocol::User;
use sessionlink_provider::{OidcProvider, ProviderConfig, Url};
use sessionlink_session::{
    LoginError, SessionConfig, SessionController, SessionEvent, SessionState, SessionWatch,
};
use tokio::sync::broadcast;

use crate::SessionLinkError;

/// The controller type `SessionLink` wires up.
pub type DefaultController = SessionController<Arc<OidcProvider>, Arc<HttpUserBackend>>;

/// Builder for configuring and starting a [`SessionLink`].
///
/// # Example
///
/// ```rust,ignore
/// use sessionlink::prelude::*;
///
/// let link = SessionLink::builder()
///     .provider(ProviderConfig::new(client_id, authorize, token, redirect))
///     .backend(BackendConfig::new("https://api.example.com"))
///     .build()
///     .await?;
/// ```
pub struct SessionLinkBuilder {
    provider: Option<ProviderConfig>,
    backend: Option<BackendConfig>,
    session_config: SessionConfig,
}

impl SessionLinkBuilder {
    /// Creates a builder with nothing configured.
    pub fn new() -> Self {
        Self {
            provider: None,
            backend: None,
            session_config: SessionConfig::default(),
        }
    }

    /// Fills the provider and backend settings from `SESSIONLINK_*`
    /// environment variables. Missing variables leave that part unset;
    /// [`build`](Self::build) reports it.
    pub fn from_env() -> Self {
        Self {
            provider: ProviderConfig::from_env(),
            backend: BackendConfig::from_env(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the identity provider configuration.
    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.provider = Some(config);
        self
    }

    /// Sets the user backend configuration.
    pub fn backend(mut self, config: BackendConfig) -> Self {
        self.backend = Some(config);
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Builds the HTTP clients and starts the session controller.
    ///
    /// Must run inside a Tokio runtime.
    ///
    /// # Errors
    /// - [`SessionLinkError::MissingConfig`] if the provider or backend
    ///   was never configured
    /// - client setup errors from either side
    pub async fn build(self) -> Result<SessionLink, SessionLinkError> {
        let provider_config = self
            .provider
            .ok_or(SessionLinkError::MissingConfig("identity provider"))?;
        let backend_config = self
            .backend
            .ok_or(SessionLinkError::MissingConfig("user backend"))?;

        let provider = Arc::new(OidcProvider::new(provider_config)?);
        let backend = Arc::new(HttpUserBackend::new(backend_config)?);
        let controller = SessionController::new(
            Arc::clone(&provider),
            Arc::clone(&backend),
            self.session_config,
        );

        tracing::info!(
            token_url = %provider.config().token_url,
            backend = %backend.config().login_endpoint(),
            "sessionlink ready"
        );
        Ok(SessionLink {
            provider,
            controller,
        })
    }
}

impl Default for SessionLinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running login session for one application.
///
/// The host opens [`login_url`](Self::login_url) in a browser, then hands
/// the redirect it receives to [`complete_login`](Self::complete_login).
/// Everything after that shows up on [`subscribe`](Self::subscribe).
pub struct SessionLink {
    provider: Arc<OidcProvider>,
    controller: DefaultController,
}

impl SessionLink {
    /// Creates a new builder.
    pub fn builder() -> SessionLinkBuilder {
        SessionLinkBuilder::new()
    }

    /// The address to open for the external login. `None` if the provider
    /// is misconfigured.
    pub fn login_url(&self) -> Option<Url> {
        self.controller.login_url()
    }

    /// Delivers the provider's redirect. The controller picks up the
    /// result through its completion signal whether or not this fails.
    ///
    /// # Errors
    /// The provider error, for the host's own reporting.
    pub async fn complete_login(&self, redirect: &Url) -> Result<(), SessionLinkError> {
        Ok(self.provider.complete_login(redirect).await?)
    }

    /// The user abandoned the external login.
    pub fn cancel_login(&self) {
        self.provider.cancel_login();
    }

    /// Authenticates with whatever token is available now.
    pub async fn request_login(&self) -> Result<User, LoginError> {
        self.controller.request_login().await
    }

    /// Signs the current user out.
    pub async fn sign_out(&self) {
        self.controller.sign_out().await;
    }

    /// Snapshot of the current user.
    pub fn user(&self) -> Option<User> {
        self.controller.user()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Observes the current state and its changes.
    pub fn subscribe(&self) -> SessionWatch {
        self.controller.subscribe()
    }

    /// Observes every transition from now on.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.controller.events()
    }

    /// The underlying provider, for out-of-band credential handling.
    pub fn provider(&self) -> &OidcProvider {
        &self.provider
    }

    /// The underlying controller.
    pub fn controller(&self) -> &DefaultController {
        &self.controller
    }
}
