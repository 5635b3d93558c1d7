use sessionlink_protocol::ProtocolError;

/// Errors that can occur in the identity provider bridge.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No valid cached credential: the login never completed, was
    /// cancelled, or the credential expired.
    #[error("no valid credential available")]
    CredentialUnavailable,

    /// The redirect's `state` didn't match the one we issued, or we never
    /// issued one.
    #[error("login state mismatch")]
    StateMismatch,

    /// The redirect carried neither a `code` nor an `error`.
    #[error("redirect is missing the authorization code")]
    MissingCode,

    /// The provider reported an error on the redirect (`error=access_denied`).
    #[error("provider denied login: {0}")]
    Denied(String),

    /// Building the HTTP client failed.
    #[error("http client setup failed: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    TokenRequest(#[source] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {body}")]
    TokenRejected { status: u16, body: String },

    /// The token endpoint's body didn't decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
