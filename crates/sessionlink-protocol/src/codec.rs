//! Codec trait and implementations for decoding response payloads.
//!
//! A "codec" turns raw bytes into Rust types.
//! The HTTP clients in this workspace read response bodies as bytes and
//! hand them to a [`Codec`], so a body that doesn't match the expected
//! shape surfaces as one uniform [`ProtocolError::Decode`] no matter which
//! endpoint produced it.

use serde::de::DeserializeOwned;

use crate::ProtocolError;

/// A codec that decodes bytes into Rust types.
///
/// `Send + Sync + 'static` because codecs live inside clients that are
/// shared across Tokio tasks for the life of the application.
pub trait Codec: Send + Sync + 'static {
    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Both the token endpoint and the user backend speak JSON, so this is the
/// only codec shipped. It sits behind the `json` feature (on by default).
///
/// ## Example
///
/// ```rust
/// use sessionlink_protocol::{Codec, JsonCodec, LoginResponse};
///
/// let body = br#"{"user":{"id":"1","firstName":"Ada","lastName":"L","email":"a@b.c"}}"#;
/// let decoded: LoginResponse = JsonCodec.decode(body).unwrap();
/// assert_eq!(decoded.user.first_name, "Ada");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
