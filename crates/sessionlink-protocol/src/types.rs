//! Core types shared by every sessionlink crate.
//!
//! These are the values that cross crate boundaries: the user record the
//! backend hands back, the bearer token the identity provider hands out,
//! and the zero-payload completion signal. Some of them also travel "on
//! the wire" (the user record arrives as JSON from the backend), so they
//! carry serde derives.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The backend's identifier for a user.
///
/// Newtype over `String` so it can't be confused with an email or a token
/// in function signatures. `#[serde(transparent)]` keeps it a plain string
/// in JSON: `UserId("4")` is `"4"`, not `{"0":"4"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// An authenticated principal, as returned by the user backend.
///
/// Treated as an immutable value once fetched. The session controller never
/// compares two users; each successful fetch simply replaces the last one.
///
/// The backend speaks camelCase (`firstName`), hence `rename_all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier.
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    /// `"first last"`, for greeting banners and logs.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// An opaque bearer token.
///
/// Produced by the identity provider, handed to the user backend, and
/// never persisted by this workspace. `Debug` is implemented by hand so a
/// stray `{:?}` in a log line prints `AccessToken(***)` instead of the
/// secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw bearer string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw bearer string, for building an `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty string, which no provider ever issues.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

// ---------------------------------------------------------------------------
// CompletionSignal
// ---------------------------------------------------------------------------

/// "The external login UI just finished."
///
/// Carries nothing else on purpose: the signal does NOT say whether the
/// login succeeded. Whoever receives it has to ask the identity provider
/// for a token to find out. Duplicates and spurious signals are normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSignal;

// ---------------------------------------------------------------------------
// Backend envelope
// ---------------------------------------------------------------------------

/// Body of a successful backend login call: `{"user": { ... }}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The backend's JSON shape is an external contract. These tests pin
    //! the serde attributes that have to match it.

    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId("4".into()),
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: Some("555-0100".into()),
        }
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId("4".into())).unwrap();
        assert_eq!(json, "\"4\"");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId("17".into()).to_string(), "U-17");
    }

    #[test]
    fn test_user_uses_camel_case_fields() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["lastName"], "Lovelace");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_user_optional_fields_default_when_missing() {
        // Backends omit optional columns entirely rather than sending null.
        let json = r#"{
            "id": "9",
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.com"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.phone, None);
        assert_eq!(user.middle_name, None);
        assert_eq!(user.display_name(), "Grace Hopper");
    }

    #[test]
    fn test_login_response_requires_user_field() {
        let result: Result<LoginResponse, _> =
            serde_json::from_str(r#"{"account": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        let printed = format!("{token:?}");

        assert!(!printed.contains("super-secret"));
        assert_eq!(token.as_str(), "super-secret");
    }

    #[test]
    fn test_access_token_is_empty() {
        assert!(AccessToken::from("").is_empty());
        assert!(!AccessToken::from("abc").is_empty());
    }
}
