//! Where new guest sessions come from.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use larder::{
    credentials::GuestSession,
    guest::{GUEST_SESSION_TTL, new_guest_session},
};
use mockall::automock;
use tracing::debug;

use crate::domain::sessions::{api::SessionApi, errors::SessionError};

/// Generates guest sessions on the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGuestSessions;

#[async_trait]
impl GuestSessionIssuer for LocalGuestSessions {
    async fn issue(&self, now: Timestamp) -> Result<GuestSession, SessionError> {
        new_guest_session(now).map_err(SessionError::Expiry)
    }
}

/// Asks the shop API for guest sessions.
#[derive(Clone)]
pub struct RemoteGuestSessions {
    api: Arc<dyn SessionApi>,
}

impl RemoteGuestSessions {
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for RemoteGuestSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteGuestSessions").finish_non_exhaustive()
    }
}

#[async_trait]
impl GuestSessionIssuer for RemoteGuestSessions {
    async fn issue(&self, now: Timestamp) -> Result<GuestSession, SessionError> {
        let issued = self.api.create_guest_session().await?;

        let expires_at = match issued.expires_at {
            Some(expires_at) => expires_at,
            None => {
                debug!("guest session issued without expiry, assuming default lifetime");

                now.checked_add(GUEST_SESSION_TTL)
                    .map_err(SessionError::Expiry)?
            }
        };

        Ok(GuestSession::new(issued.session_key, expires_at))
    }
}

#[automock]
#[async_trait]
pub trait GuestSessionIssuer: Send + Sync {
    /// Produce a fresh guest session valid from `now`.
    async fn issue(&self, now: Timestamp) -> Result<GuestSession, SessionError>;
}
