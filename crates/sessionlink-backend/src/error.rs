/// Errors that can occur while authenticating against the user backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// `authenticate` was called before any `provide_token`.
    #[error("no bearer token provided")]
    MissingToken,

    /// The backend rejected the token (HTTP 401 or 403).
    #[error("backend rejected the token")]
    Unauthorized,

    /// The backend answered with a status we don't handle.
    #[error("backend returned unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The request never got a response: DNS, connect, TLS, timeout.
    #[cfg(feature = "http")]
    #[error("backend request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// Building the HTTP client failed.
    #[cfg(feature = "http")]
    #[error("http client setup failed: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The response body isn't a user record.
    #[error("could not decode user: {0}")]
    Decoding(#[from] sessionlink_protocol::ProtocolError),
}
