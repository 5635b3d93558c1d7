//! Error types for the session layer.

use sessionlink_backend::BackendError;
use sessionlink_provider::ProviderError;

/// Why a login attempt failed, as subscribers see it.
///
/// `Clone + PartialEq` because the same value is stored in the published
/// [`SessionState`](crate::SessionState), broadcast as a
/// [`SessionEvent`](crate::SessionEvent), and returned to the caller.
/// Lower-level errors are carried as strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// No valid provider credential (and no token already handed to the
    /// backend) at the time of the attempt.
    #[error("no valid credential available")]
    CredentialUnavailable,

    /// A completion-triggered attempt couldn't get a token from the
    /// provider. The cause is only logged.
    #[error("login failed")]
    LoginFailed,

    /// The backend rejected the token.
    #[error("backend rejected the token")]
    Unauthorized,

    /// Transport failure or an unexpected backend/provider response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered, but not with a user.
    #[error("could not decode user: {0}")]
    Decoding(String),
}

impl From<BackendError> for LoginError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::MissingToken => Self::CredentialUnavailable,
            BackendError::Unauthorized => Self::Unauthorized,
            BackendError::Decoding(e) => Self::Decoding(e.to_string()),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Only used on the explicit `request_login` path. Completion-triggered
/// attempts replace every provider error with [`LoginError::LoginFailed`].
impl From<ProviderError> for LoginError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CredentialUnavailable => Self::CredentialUnavailable,
            ProviderError::Protocol(e) => Self::Decoding(e.to_string()),
            ProviderError::TokenRequest(e) => Self::Network(e.to_string()),
            ProviderError::TokenRejected { status, .. } => {
                Self::Network(format!("token endpoint returned {status}"))
            }
            _ => Self::LoginFailed,
        }
    }
}
