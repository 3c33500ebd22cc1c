//! Request credentials and header selection.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Header carrying the bearer token of an authenticated user.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header carrying an anonymous guest session key.
pub const GUEST_SESSION_HEADER: &str = "X-Guest-Session";

/// The single credential attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Authenticated user access token.
    Bearer(String),

    /// Anonymous guest session key.
    Guest(String),
}

impl Credential {
    /// Header name and value for this credential.
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::Bearer(token) => (AUTHORIZATION_HEADER, format!("Bearer {token}")),
            Self::Guest(key) => (GUEST_SESSION_HEADER, key.clone()),
        }
    }

    /// Whether this is a guest credential.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }

    /// Short label safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::Guest(_) => "guest",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Credential::Bearer(**redacted**)"),
            Self::Guest(_) => f.write_str("Credential::Guest(**redacted**)"),
        }
    }
}

/// An anonymous guest session and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSession {
    /// Session key sent in [`GUEST_SESSION_HEADER`]
    pub session_key: String,

    /// When the session stops being valid
    pub expires_at: Timestamp,
}

impl GuestSession {
    /// Create a guest session.
    pub fn new(session_key: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            session_key: session_key.into(),
            expires_at,
        }
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// Everything the client knows about who is making a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Access token of the logged in user
    pub token: Option<String>,

    /// Guest session, kept across logins until merged
    pub guest: Option<GuestSession>,
}

impl Credentials {
    /// Pick the credential for a request made at `now`.
    ///
    /// The bearer token always wins. A guest key is only used while unexpired. `None` means the
    /// caller must bootstrap a guest session first.
    pub fn select(&self, now: Timestamp) -> Option<Credential> {
        if let Some(token) = &self.token {
            return Some(Credential::Bearer(token.clone()));
        }

        self.guest
            .as_ref()
            .filter(|guest| !guest.is_expired_at(now))
            .map(|guest| Credential::Guest(guest.session_key.clone()))
    }

    /// Request headers for `now`: exactly one credential header, or none.
    pub fn headers(&self, now: Timestamp) -> Vec<(&'static str, String)> {
        self.select(now)
            .map(|credential| vec![credential.header()])
            .unwrap_or_default()
    }

    /// Whether the user is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether requests are made as a guest.
    pub fn is_guest(&self) -> bool {
        self.token.is_none() && self.guest.is_some()
    }
}
