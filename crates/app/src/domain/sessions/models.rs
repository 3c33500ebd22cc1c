//! Session models.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Profile of the logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Access and refresh tokens returned by a successful login.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"**redacted**")
            .field("refresh", &"**redacted**")
            .finish()
    }
}

/// Guest session as issued by the shop API. The expiry is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuedGuestSession {
    pub session_key: String,

    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}
