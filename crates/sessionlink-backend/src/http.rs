//! HTTP user backend using `reqwest`.
//!
//! `POST {base_url}{login_path}` with `Authorization: Bearer <token>`,
//! expecting `{"user": {...}}` back.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::StatusCode;
use sessionlink_protocol::{AccessToken, Codec, JsonCodec, LoginResponse, User};

use crate::{BackendError, UserBackend};

/// Where the user backend lives.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Scheme + host (+ optional prefix), e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Default: `/auth/login`.
    pub login_path: String,
    /// Default: 30 seconds.
    pub timeout: Duration,
}

impl BackendConfig {
    /// Creates a config with the default login path and timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_path: "/auth/login".into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the login path.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads from `SESSIONLINK_BACKEND_URL` and the optional
    /// `SESSIONLINK_BACKEND_LOGIN_PATH`. `None` if the URL is missing.
    pub fn from_env() -> Option<Self> {
        let mut config = Self::new(std::env::var("SESSIONLINK_BACKEND_URL").ok()?);
        if let Ok(path) = std::env::var("SESSIONLINK_BACKEND_LOGIN_PATH") {
            config.login_path = path;
        }
        Some(config)
    }

    /// The full login endpoint, tolerant of a trailing slash on the base
    /// and a missing leading slash on the path.
    pub fn login_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        )
    }
}

/// A [`UserBackend`] that talks HTTP.
pub struct HttpUserBackend {
    config: BackendConfig,
    http: reqwest::Client,
    codec: JsonCodec,
    token: RwLock<Option<AccessToken>>,
}

impl HttpUserBackend {
    /// Creates a backend client with its own connection pool.
    ///
    /// # Errors
    /// [`BackendError::ClientSetup`] if the TLS backend can't initialize.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(BackendError::ClientSetup)?;
        Ok(Self {
            config,
            http,
            codec: JsonCodec,
            token: RwLock::new(None),
        })
    }

    /// The config this client was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn current_token(&self) -> Option<AccessToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UserBackend for HttpUserBackend {
    fn provide_token(&self, token: AccessToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    async fn authenticate(&self) -> Result<User, BackendError> {
        let token = self.current_token().ok_or(BackendError::MissingToken)?;

        let response = self
            .http
            .post(self.config.login_endpoint())
            .bearer_auth(token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(BackendError::Network)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(BackendError::Unauthorized);
            }
            status if !status.is_success() => {
                return Err(BackendError::UnexpectedStatus(status.as_u16()));
            }
            _ => {}
        }

        let body = response.bytes().await.map_err(BackendError::Network)?;
        let LoginResponse { user } = self.codec.decode(&body)?;
        tracing::debug!(user_id = %user.id, "backend accepted token");
        Ok(user)
    }

    fn clear_token(&self) {
        self.token.write().unwrap_or_else(PoisonError::into_inner).take();
    }
}
