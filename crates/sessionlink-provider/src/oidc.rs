//! Authorization-code provider: builds the login URL, handles the
//! redirect, and keeps the resulting credential in memory.
//!
//! The flow the host drives:
//!
//! ```text
//! authorization_url() ──→ (user logs in, out of process) ──→ redirect
//!                                                               │
//!                                     complete_login(&redirect) ◄┘
//!                                        │  POST token_url
//!                                        │  cache Credentials
//!                                        ▼
//!                              completion signal (always)
//! ```
//!
//! The signal fires whether or not the login worked. Listeners find out
//! by calling [`IdentityProvider::exchange_credential_for_token`].

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use sessionlink_protocol::{AccessToken, Codec, CompletionSignal, JsonCodec, ProtocolError};
use tokio::sync::broadcast;

use crate::pkce::PkceChallenge;
use crate::{CompletionEvents, IdentityProvider, ProviderError};

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Where the provider lives and who we are to it.
///
/// Endpoints are kept as strings: a bad URL is a misconfiguration that
/// [`OidcProvider::authorization_url`] reports as `None`, not a
/// construction failure.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    /// Default: `openid profile email offline_access`.
    pub scopes: Vec<String>,
    /// Timeout for token endpoint calls. Default: 30 seconds.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Creates a config with the default scopes and timeout.
    pub fn new(
        client_id: impl Into<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            redirect_uri: redirect_uri.into(),
            scopes: ["openid", "profile", "email", "offline_access"]
                .map(String::from)
                .to_vec(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Overrides the token endpoint timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads from `SESSIONLINK_CLIENT_ID`, `SESSIONLINK_AUTHORIZE_URL`,
    /// `SESSIONLINK_TOKEN_URL`, `SESSIONLINK_REDIRECT_URI` and the optional
    /// space-separated `SESSIONLINK_SCOPES`.
    ///
    /// Returns `None` if any required variable is missing.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let mut config = Self::new(
            lookup("SESSIONLINK_CLIENT_ID")?,
            lookup("SESSIONLINK_AUTHORIZE_URL")?,
            lookup("SESSIONLINK_TOKEN_URL")?,
            lookup("SESSIONLINK_REDIRECT_URI")?,
        );
        if let Some(scopes) = lookup("SESSIONLINK_SCOPES") {
            config.scopes = scopes.split_whitespace().map(String::from).collect();
        }
        Some(config)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// What the token endpoint sends back.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// A cached login result.
///
/// Lives only in memory. `expires_at: None` means the provider didn't say,
/// and the credential is treated as valid until cleared.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: AccessToken,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<Instant>,
}

impl Credentials {
    /// Credentials with only an access token and no expiry.
    pub fn new(access_token: impl Into<AccessToken>) -> Self {
        Self {
            access_token: access_token.into(),
            id_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Sets the expiry instant.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: Instant) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Builds credentials from a token response received at `issued_at`.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] if the access token is empty.
    pub fn from_token_response(
        response: TokenResponse,
        issued_at: Instant,
    ) -> Result<Self, ProtocolError> {
        if response.access_token.is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "token response has an empty access_token".into(),
            ));
        }
        Ok(Self {
            access_token: AccessToken::new(response.access_token),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            // A lifetime too large for `Instant` is as good as no expiry.
            expires_at: response
                .expires_in
                .and_then(|secs| issued_at.checked_add(Duration::from_secs(secs))),
        })
    }

    /// `true` if the credential can still be used at `now`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

// ---------------------------------------------------------------------------
// OidcProvider
// ---------------------------------------------------------------------------

/// An [`IdentityProvider`] for an OIDC authorization-code provider.
///
/// Share it as `Arc<OidcProvider>`: the session controller holds one
/// handle, the host keeps another to deliver redirects.
///
/// The two `std::sync` locks guard tiny critical sections and are never
/// held across an `.await`.
pub struct OidcProvider {
    config: ProviderConfig,
    http: reqwest::Client,
    codec: JsonCodec,
    events: CompletionEvents,

    /// The last authorization URL handed out, until its redirect arrives.
    pending: Mutex<Option<PendingLogin>>,

    /// The most recent successful login.
    credentials: RwLock<Option<Credentials>>,
}

impl OidcProvider {
    /// Creates a provider with its own HTTP client.
    ///
    /// # Errors
    /// [`ProviderError::ClientSetup`] if the TLS backend can't initialize.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::ClientSetup)?;
        Ok(Self {
            config,
            http,
            codec: JsonCodec,
            events: CompletionEvents::new(),
            pending: Mutex::new(None),
            credentials: RwLock::new(None),
        })
    }

    /// The config this provider was built with.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Handles the redirect the host received after the external login.
    ///
    /// Fires exactly one completion signal before returning, on success
    /// AND on failure.
    ///
    /// # Errors
    /// - [`ProviderError::Denied`]: the redirect carries `error=...`
    /// - [`ProviderError::StateMismatch`]: unknown or stale `state`
    /// - [`ProviderError::MissingCode`]: no `code` parameter
    /// - token endpoint errors from [`Self::request_token`]
    pub async fn complete_login(&self, redirect: &Url) -> Result<(), ProviderError> {
        let result = self.finish_login(redirect).await;
        match &result {
            Ok(()) => tracing::info!("provider login completed"),
            Err(e) => tracing::warn!(error = %e, "provider login did not complete"),
        }
        self.events.notify();
        result
    }

    /// The user closed the login UI without finishing.
    ///
    /// Forgets the pending state and fires a completion signal; the
    /// listener will find no credential and report a failed login.
    pub fn cancel_login(&self) {
        self.lock_pending().take();
        tracing::info!("provider login cancelled");
        self.events.notify();
    }

    /// Caches credentials obtained out of band and fires a completion signal.
    pub fn store_credentials(&self, credentials: Credentials) {
        *self.write_credentials() = Some(credentials);
        self.events.notify();
    }

    /// `true` if a credential is cached and not expired.
    pub fn has_valid_credentials(&self) -> bool {
        self.cached_token().is_ok()
    }

    async fn finish_login(&self, redirect: &Url) -> Result<(), ProviderError> {
        let mut code = None;
        let mut state = None;
        let mut denied = None;
        for (key, value) in redirect.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error_description" => denied = Some(value.into_owned()),
                "error" if denied.is_none() => denied = Some(value.into_owned()),
                _ => {}
            }
        }

        // The pending login is single-use whatever happens next.
        let pending = self.lock_pending().take();

        if let Some(reason) = denied {
            return Err(ProviderError::Denied(reason));
        }
        let pending = match (pending, state) {
            (Some(pending), Some(got)) if pending.state == got => pending,
            _ => return Err(ProviderError::StateMismatch),
        };
        let code = code.ok_or(ProviderError::MissingCode)?;

        let credentials = self
            .request_token(&code, &pending.pkce.verifier)
            .await?;
        *self.write_credentials() = Some(credentials);
        Ok(())
    }

    /// Trades an authorization code, plus the PKCE verifier issued with it,
    /// for credentials at the token endpoint.
    ///
    /// # Errors
    /// - [`ProviderError::TokenRequest`]: the endpoint was unreachable
    /// - [`ProviderError::TokenRejected`]: non-2xx status
    /// - [`ProviderError::Protocol`]: the body didn't decode
    pub async fn request_token(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Credentials, ProviderError> {
        let issued_at = Instant::now();
        let response = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(ProviderError::TokenRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(ProviderError::TokenRequest)?;
        let token: TokenResponse = self.codec.decode(&body)?;
        Ok(Credentials::from_token_response(token, issued_at)?)
    }

    fn cached_token(&self) -> Result<AccessToken, ProviderError> {
        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match credentials.as_ref() {
            Some(c) if c.is_valid_at(Instant::now()) => Ok(c.access_token.clone()),
            Some(_) => {
                tracing::debug!("cached credentials expired");
                Err(ProviderError::CredentialUnavailable)
            }
            None => Err(ProviderError::CredentialUnavailable),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingLogin>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_credentials(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityProvider for OidcProvider {
    fn authorization_url(&self) -> Option<Url> {
        if self.config.client_id.trim().is_empty() {
            tracing::warn!("client_id is empty; no authorization URL");
            return None;
        }
        if self.config.redirect_uri.trim().is_empty() {
            tracing::warn!("redirect_uri is empty; no authorization URL");
            return None;
        }
        let mut url = match Url::parse(&self.config.authorize_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "authorize_url is not a valid URL");
                return None;
            }
        };

        let state = generate_nonce();
        let pkce = PkceChallenge::generate();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("nonce", &generate_nonce())
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", PkceChallenge::METHOD);

        *self.lock_pending() = Some(PendingLogin { state, pkce });
        Some(url)
    }

    async fn exchange_credential_for_token(&self) -> Result<AccessToken, ProviderError> {
        self.cached_token()
    }

    fn completion_events(&self) -> broadcast::Receiver<CompletionSignal> {
        self.events.subscribe()
    }

    /// Drops the cached credential. No signal is fired.
    fn clear_credentials(&self) {
        self.write_credentials().take();
        tracing::debug!("provider credentials cleared");
    }
}

/// What `authorization_url` hands out and `complete_login` checks.
#[derive(Debug)]
struct PendingLogin {
    state: String,
    pkce: PkceChallenge,
}

/// 16 random bytes as 32 lowercase hex characters.
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
