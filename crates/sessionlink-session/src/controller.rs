//! The session controller: the one place that decides who is logged in.
//!
//! It is responsible for:
//! - Holding the current [`SessionState`] and publishing every change
//! - Listening for the provider's completion signals
//! - Running the exchange → provide token → authenticate sequence
//! - Turning failures into [`LoginError`]s subscribers can act on
//!
//! # Concurrency note
//!
//! Two things can start an attempt: an explicit [`request_login`] call and
//! a completion signal. Both take the same `attempt` lock before touching
//! the provider or backend, so at most one attempt is in flight and the
//! token handed to the backend always belongs to the attempt that reads
//! it back. Waiting attempts run in arrival order (Tokio's mutex is fair).
//!
//! Completion signals are handled one at a time by a listener task the
//! controller owns. Dropping the controller aborts it.
//!
//! [`request_login`]: SessionController::request_login

use std::sync::Arc;

use sessionlink_backend::{BackendError, UserBackend};
use sessionlink_protocol::{CompletionSignal, User};
use sessionlink_provider::{IdentityProvider, Url};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

use crate::{LoginError, SessionConfig, SessionEvent, SessionState, SessionWatch};

/// Owns the current user and drives the login handshake.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ [NoUser] ──(request_login | completion signal)──→ [Authenticating]
///                                                                 │
///                             ┌───────────── ok ──────────────────┤
///                             ▼                                   ▼ err
///                     [Authenticated(user)]              [Failed(error)]
///                             │                                   │
///                             └──── sign_out() ──→ [NoUser] ◄─────┘
/// ```
///
/// One instance per application, created inside a Tokio runtime.
pub struct SessionController<P: IdentityProvider, B: UserBackend> {
    core: Arc<Core<P, B>>,

    /// The completion-signal listener. Aborted on drop.
    listener: JoinHandle<()>,
}

/// Everything the listener task and the public API share.
struct Core<P, B> {
    provider: P,
    backend: B,

    /// The single state cell. Only `publish` writes to it.
    state: watch::Sender<SessionState>,

    /// Every transition, in order.
    events: broadcast::Sender<SessionEvent>,

    /// Held for the whole duration of an attempt (and of `sign_out`).
    attempt: Mutex<()>,
}

impl<P: IdentityProvider, B: UserBackend> SessionController<P, B> {
    /// Creates a controller in the `NoUser` state and starts listening for
    /// the provider's completion signals.
    ///
    /// The subscription is taken before this returns, so a signal fired
    /// right afterwards is not lost.
    ///
    /// # Panics
    /// If called outside a Tokio runtime (the listener is spawned here).
    pub fn new(provider: P, backend: B, config: SessionConfig) -> Self {
        let signals = provider.completion_events();
        let (state, _) = watch::channel(SessionState::NoUser);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let core = Arc::new(Core {
            provider,
            backend,
            state,
            events,
            attempt: Mutex::new(()),
        });

        let listener = tokio::spawn(listen(Arc::clone(&core), signals));
        tracing::debug!("session controller listening for completion signals");

        Self { core, listener }
    }

    /// The address the host should open to start a login.
    ///
    /// `None` if the provider is misconfigured.
    pub fn login_url(&self) -> Option<Url> {
        let url = self.core.provider.authorization_url();
        if url.is_none() {
            tracing::warn!("identity provider returned no login URL");
        }
        url
    }

    /// Authenticates with whatever token is available right now.
    ///
    /// Uses the token the backend already has; if it has none, asks the
    /// provider for one first. The outcome is published on the state
    /// stream AND returned here with full detail.
    ///
    /// # Errors
    /// - [`LoginError::CredentialUnavailable`]: no token anywhere
    /// - [`LoginError::Unauthorized`], [`LoginError::Network`],
    ///   [`LoginError::Decoding`]: from the backend
    pub async fn request_login(&self) -> Result<User, LoginError> {
        self.core.request_login().await
    }

    /// Runs the completion-signal handling once, as if a signal had just
    /// arrived.
    ///
    /// Any provider error becomes [`LoginError::LoginFailed`] and the
    /// backend's token is dropped along with it.
    pub async fn handle_completion(&self) -> Result<User, LoginError> {
        self.core.handle_completion().await
    }

    /// Clears the session: forgets the provider credential and the
    /// backend's token, then publishes `NoUser`.
    ///
    /// Waits for any in-flight attempt to finish first.
    pub async fn sign_out(&self) {
        let _attempt = self.core.attempt.lock().await;
        self.core.provider.clear_credentials();
        self.core.backend.clear_token();
        self.core.publish(SessionState::NoUser, SessionEvent::SignedOut);
        tracing::info!("signed out");
    }

    /// Snapshot of the current user.
    pub fn user(&self) -> Option<User> {
        self.core.state.borrow().user().cloned()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.core.state.borrow().clone()
    }

    /// Subscribes to the current state (replayed immediately) and its
    /// future changes.
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch::new(self.core.state.subscribe())
    }

    /// Subscribes to every transition from now on.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.core.events.subscribe()
    }

    /// Stops listening for completion signals. Explicit calls keep working.
    pub fn shutdown(&self) {
        self.listener.abort();
    }

    /// `true` while the completion-signal listener is running.
    pub fn is_listening(&self) -> bool {
        !self.listener.is_finished()
    }
}

impl<P: IdentityProvider, B: UserBackend> Drop for SessionController<P, B> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl<P: IdentityProvider, B: UserBackend> Core<P, B> {
    async fn request_login(&self) -> Result<User, LoginError> {
        let _attempt = self.attempt.lock().await;
        self.publish(SessionState::Authenticating, SessionEvent::Authenticating);
        tracing::debug!("explicit login requested");

        let result = match self.backend.authenticate().await {
            Err(BackendError::MissingToken) => self.authenticate_with_fresh_token().await,
            other => other.map_err(LoginError::from),
        };

        match result {
            Ok(user) => Ok(self.publish_user(user)),
            Err(err) => Err(self.publish_failure(err)),
        }
    }

    async fn authenticate_with_fresh_token(&self) -> Result<User, LoginError> {
        let token = self.provider.exchange_credential_for_token().await?;
        self.backend.provide_token(token);
        Ok(self.backend.authenticate().await?)
    }

    async fn handle_completion(&self) -> Result<User, LoginError> {
        let _attempt = self.attempt.lock().await;
        self.publish(SessionState::Authenticating, SessionEvent::Authenticating);

        let token = match self.provider.exchange_credential_for_token().await {
            Ok(token) => token,
            Err(e) => {
                // Only the generic kind reaches subscribers.
                tracing::debug!(error = %e, "no token after completion signal");
                // The provider has no credential now; neither may the backend.
                self.backend.clear_token();
                return Err(self.publish_failure(LoginError::LoginFailed));
            }
        };

        self.backend.provide_token(token);
        match self.backend.authenticate().await {
            Ok(user) => Ok(self.publish_user(user)),
            Err(e) => Err(self.publish_failure(e.into())),
        }
    }

    fn publish_user(&self, user: User) -> User {
        tracing::info!(user_id = %user.id, "signed in");
        self.publish(
            SessionState::Authenticated(user.clone()),
            SessionEvent::SignedIn(user.clone()),
        );
        user
    }

    fn publish_failure(&self, err: LoginError) -> LoginError {
        tracing::info!(error = %err, "login attempt failed");
        self.publish(
            SessionState::Failed(err.clone()),
            SessionEvent::Failed(err.clone()),
        );
        err
    }

    fn publish(&self, state: SessionState, event: SessionEvent) {
        // `send_replace` stores the value even with no subscribers.
        self.state.send_replace(state);
        let _ = self.events.send(event);
    }
}

/// The listener task: one attempt per completion signal, in order.
async fn listen<P: IdentityProvider, B: UserBackend>(
    core: Arc<Core<P, B>>,
    mut signals: broadcast::Receiver<CompletionSignal>,
) {
    loop {
        match signals.recv().await {
            Ok(CompletionSignal) => {
                let _ = core.handle_completion().await;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "missed completion signals; running one catch-up attempt");
                let _ = core.handle_completion().await;
            }
            Err(RecvError::Closed) => {
                tracing::debug!("completion signal source closed");
                break;
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionController`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! The provider and backend are in-memory fakes. The provider hands out
    //! tokens from a script (one entry per exchange; an exhausted script
    //! means "no credential"), and the backend knows exactly one good token.

    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use sessionlink_protocol::{AccessToken, UserId};
    use sessionlink_provider::{CompletionEvents, ProviderError};

    use super::*;

    // -- Fakes ------------------------------------------------------------

    struct FakeProvider {
        url: Option<Url>,
        script: StdMutex<VecDeque<&'static str>>,
        events: CompletionEvents,
    }

    impl FakeProvider {
        fn with_tokens(tokens: &[&'static str]) -> Self {
            Self {
                url: Url::parse("https://id.example.com/authorize?client_id=x").ok(),
                script: StdMutex::new(tokens.iter().copied().collect()),
                events: CompletionEvents::new(),
            }
        }
    }

    impl IdentityProvider for FakeProvider {
        fn authorization_url(&self) -> Option<Url> {
            self.url.clone()
        }

        async fn exchange_credential_for_token(&self) -> Result<AccessToken, ProviderError> {
            match self.script.lock().unwrap().pop_front() {
                Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
                _ => Err(ProviderError::CredentialUnavailable),
            }
        }

        fn completion_events(&self) -> broadcast::Receiver<CompletionSignal> {
            self.events.subscribe()
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        token: StdMutex<Option<AccessToken>>,
    }

    impl UserBackend for FakeBackend {
        fn provide_token(&self, token: AccessToken) {
            *self.token.lock().unwrap() = Some(token);
        }

        async fn authenticate(&self) -> Result<User, BackendError> {
            let token = self.token.lock().unwrap().clone();
            match token.as_ref().map(AccessToken::as_str) {
                None => Err(BackendError::MissingToken),
                Some("good") => Ok(ada()),
                Some("flaky") => Err(BackendError::UnexpectedStatus(503)),
                Some(_) => Err(BackendError::Unauthorized),
            }
        }

        fn clear_token(&self) {
            self.token.lock().unwrap().take();
        }
    }

    fn ada() -> User {
        User {
            id: UserId("7".into()),
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
        }
    }

    fn controller(tokens: &[&'static str]) -> SessionController<FakeProvider, FakeBackend> {
        SessionController::new(
            FakeProvider::with_tokens(tokens),
            FakeBackend::default(),
            SessionConfig::default(),
        )
    }

    // =====================================================================
    // new()
    // =====================================================================

    #[tokio::test]
    async fn test_new_starts_with_no_user() {
        let ctl = controller(&[]);

        assert_eq!(ctl.state(), SessionState::NoUser);
        assert_eq!(ctl.user(), None);
        assert!(ctl.is_listening());
    }

    #[tokio::test]
    async fn test_new_subscribes_to_completion_events() {
        let ctl = controller(&[]);
        assert_eq!(ctl.core.provider.events.subscriber_count(), 1);
    }

    // =====================================================================
    // login_url()
    // =====================================================================

    #[tokio::test]
    async fn test_login_url_passes_provider_url_through() {
        let ctl = controller(&[]);
        let url = ctl.login_url().expect("fake provider has a URL");
        assert_eq!(url.host_str(), Some("id.example.com"));
    }

    #[tokio::test]
    async fn test_login_url_misconfigured_provider_returns_none() {
        let mut provider = FakeProvider::with_tokens(&[]);
        provider.url = None;
        let ctl = SessionController::new(provider, FakeBackend::default(), SessionConfig::default());

        assert_eq!(ctl.login_url(), None);
    }

    // =====================================================================
    // handle_completion()
    // =====================================================================

    #[tokio::test]
    async fn test_handle_completion_exchange_fails_publishes_login_failed() {
        let ctl = controller(&[]);

        let result = ctl.handle_completion().await;

        assert_eq!(result, Err(LoginError::LoginFailed));
        assert_eq!(ctl.state(), SessionState::Failed(LoginError::LoginFailed));
        assert_eq!(ctl.user(), None);
    }

    #[tokio::test]
    async fn test_handle_completion_success_publishes_backend_user() {
        let ctl = controller(&["good"]);

        let user = ctl.handle_completion().await.expect("should sign in");

        assert_eq!(user, ada());
        assert_eq!(ctl.user(), Some(ada()));
    }

    #[tokio::test]
    async fn test_handle_completion_backend_rejects_publishes_error_without_user() {
        let ctl = controller(&["revoked"]);

        let result = ctl.handle_completion().await;

        assert_eq!(result, Err(LoginError::Unauthorized));
        assert_eq!(ctl.state(), SessionState::Failed(LoginError::Unauthorized));
        assert_eq!(ctl.user(), None);
    }

    #[tokio::test]
    async fn test_handle_completion_exchange_failure_forgets_backend_token() {
        let ctl = controller(&["good"]);
        ctl.handle_completion().await.expect("first completion signs in");

        assert_eq!(ctl.handle_completion().await, Err(LoginError::LoginFailed));

        assert!(ctl.core.backend.token.lock().unwrap().is_none());
        assert_eq!(
            ctl.request_login().await,
            Err(LoginError::CredentialUnavailable)
        );
        assert_eq!(ctl.user(), None);
    }

    #[tokio::test]
    async fn test_handle_completion_failure_clears_previous_user() {
        let ctl = controller(&["good"]);
        ctl.handle_completion().await.unwrap();

        ctl.handle_completion().await.unwrap_err();

        assert_eq!(ctl.user(), None);
    }

    // =====================================================================
    // request_login()
    // =====================================================================

    #[tokio::test]
    async fn test_request_login_no_credential_is_credential_unavailable() {
        let ctl = controller(&[]);

        let result = ctl.request_login().await;

        assert_eq!(result, Err(LoginError::CredentialUnavailable));
        assert_eq!(
            ctl.state(),
            SessionState::Failed(LoginError::CredentialUnavailable)
        );
    }

    #[tokio::test]
    async fn test_request_login_fetches_token_when_backend_has_none() {
        let ctl = controller(&["good"]);

        let user = ctl.request_login().await.expect("should sign in");

        assert_eq!(user, ada());
        assert_eq!(ctl.state(), SessionState::Authenticated(ada()));
    }

    #[tokio::test]
    async fn test_request_login_reuses_token_already_provided() {
        // The script holds one token. The completion path consumes it;
        // request_login must not need another.
        let ctl = controller(&["good"]);
        ctl.handle_completion().await.unwrap();

        let user = ctl.request_login().await.expect("backend still has the token");

        assert_eq!(user, ada());
    }

    #[tokio::test]
    async fn test_request_login_network_error_keeps_detail() {
        let ctl = controller(&["flaky"]);

        let result = ctl.request_login().await;

        assert!(
            matches!(&result, Err(LoginError::Network(msg)) if msg.contains("503")),
            "got {result:?}"
        );
    }

    // =====================================================================
    // sign_out()
    // =====================================================================

    #[tokio::test]
    async fn test_sign_out_returns_to_no_user_and_forgets_token() {
        let ctl = controller(&["good"]);
        ctl.request_login().await.unwrap();

        ctl.sign_out().await;

        assert_eq!(ctl.state(), SessionState::NoUser);
        assert!(ctl.core.backend.token.lock().unwrap().is_none());
        // Script is exhausted and the backend forgot its token.
        assert_eq!(
            ctl.request_login().await,
            Err(LoginError::CredentialUnavailable)
        );
    }

    // =====================================================================
    // shutdown()
    // =====================================================================

    #[tokio::test]
    async fn test_shutdown_stops_listener() {
        let ctl = controller(&[]);

        ctl.shutdown();
        for _ in 0..16 {
            if !ctl.is_listening() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(!ctl.is_listening());
    }
}
