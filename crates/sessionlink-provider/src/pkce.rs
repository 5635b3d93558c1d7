//! Proof Key for Code Exchange (RFC 7636), S256 method only.
//!
//! The verifier stays in memory until the token request; only its hash
//! travels through the browser.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

/// A verifier and the challenge derived from it.
#[derive(Clone)]
pub struct PkceChallenge {
    /// Sent to the token endpoint as `code_verifier`.
    pub verifier: String,
    /// Sent on the authorization URL as `code_challenge`.
    pub challenge: String,
}

impl PkceChallenge {
    /// Value for the `code_challenge_method` parameter.
    pub const METHOD: &'static str = "S256";

    /// Draws a fresh 32-byte verifier.
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::rng().random();
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Derives the challenge for a known verifier.
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}
