//! Error types for the protocol layer.
//!
//! Each sessionlink crate defines its own error enum. A `ProtocolError`
//! always means "these bytes didn't match the shape we expected", never a
//! network or authentication problem.

/// Errors that can occur while decoding payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: an HTML error page where JSON was expected, missing
    /// required fields, or a truncated body.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but is logically invalid, e.g. an empty access
    /// token in an otherwise well-formed token response.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
