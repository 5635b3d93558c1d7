//! Unified error type for sessionlink.

use sessionlink_backend::BackendError;
use sessionlink_protocol::ProtocolError;
use sessionlink_provider::ProviderError;
use sessionlink_session::LoginError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `sessionlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
#[derive(Debug, thiserror::Error)]
pub enum SessionLinkError {
    /// Identity provider error (redirect handling, token endpoint).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// User backend error (client setup, transport).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A login attempt failed.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A required setting was not supplied.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}
