//! Session service.

use std::sync::Arc;

use jiff::Timestamp;
use larder::credentials::{Credential, Credentials, GuestSession};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    domain::sessions::{
        api::SessionApi, errors::SessionError, issuer::GuestSessionIssuer, models::User,
    },
    storage::{
        AUTH_TOKEN_KEY, CredentialStorage, GUEST_SESSION_KEY, REFRESH_TOKEN_KEY, StorageError,
        USER_KEY,
    },
};

/// Owns the client's identity.
///
/// Credentials are always read back from [`CredentialStorage`], so a login or logout made
/// through another storage handle is visible on the next request. Guest session bootstrap is
/// single flight: concurrent callers queue on one lock and later callers reuse the session the
/// first one stored.
pub struct SessionService {
    api: Arc<dyn SessionApi>,
    issuer: Arc<dyn GuestSessionIssuer>,
    storage: Arc<dyn CredentialStorage>,
    bootstrap: Mutex<()>,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    /// Restore the session held in `storage`, discarding an expired guest session.
    pub fn new(
        api: Arc<dyn SessionApi>,
        issuer: Arc<dyn GuestSessionIssuer>,
        storage: Arc<dyn CredentialStorage>,
    ) -> Self {
        let service = Self {
            api,
            issuer,
            storage,
            bootstrap: Mutex::new(()),
        };

        service.discard_expired_guest(Timestamp::now());

        service
    }

    pub fn storage(&self) -> &Arc<dyn CredentialStorage> {
        &self.storage
    }

    /// Everything currently stored about the client's identity.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.storage.get(AUTH_TOKEN_KEY),
            guest: self.guest_session(),
        }
    }

    /// The credential to attach to a request made now, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.credentials().select(Timestamp::now())
    }

    /// Request headers for the current credential: one header, or none.
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        self.credentials().headers(Timestamp::now())
    }

    pub fn is_authenticated(&self) -> bool {
        self.storage.get(AUTH_TOKEN_KEY).is_some()
    }

    pub fn has_guest_session(&self) -> bool {
        self.guest_session().is_some()
    }

    /// The stored guest session. Unreadable entries count as absent.
    pub fn guest_session(&self) -> Option<GuestSession> {
        let raw = self.storage.get(GUEST_SESSION_KEY)?;

        match serde_json::from_str(&raw) {
            Ok(guest) => Some(guest),
            Err(error) => {
                warn!("ignoring unreadable guest session: {error}");

                None
            }
        }
    }

    /// Profile stored at login.
    pub fn current_user(&self) -> Option<User> {
        let raw = self.storage.get(USER_KEY)?;

        serde_json::from_str(&raw)
            .inspect_err(|error| warn!("ignoring unreadable user profile: {error}"))
            .ok()
    }

    /// The current credential, starting a guest session when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error when a guest session cannot be issued or stored.
    pub async fn ensure_credential(&self) -> Result<Credential, SessionError> {
        if let Some(credential) = self.credential() {
            return Ok(credential);
        }

        self.initialize_guest_session().await
    }

    /// Start a guest session unless a usable credential already exists.
    ///
    /// # Errors
    ///
    /// Returns an error when a guest session cannot be issued or stored.
    pub async fn initialize_guest_session(&self) -> Result<Credential, SessionError> {
        let _bootstrap = self.bootstrap.lock().await;
        let now = Timestamp::now();

        if let Some(credential) = self.credentials().select(now) {
            debug!(credential = credential.kind(), "credential already present");

            return Ok(credential);
        }

        let guest = self.issue_guest_session(now).await?;

        Ok(Credential::Guest(guest.session_key))
    }

    /// Replace the guest session the server rejected.
    ///
    /// Only replaces the stored key while it is still `stale`. When another caller already
    /// replaced it, or the user logged in meanwhile, the newer credential is returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error when a guest session cannot be issued or stored.
    pub async fn reinitialize_guest_session(
        &self,
        stale: &str,
    ) -> Result<Credential, SessionError> {
        let _bootstrap = self.bootstrap.lock().await;
        let now = Timestamp::now();
        let credentials = self.credentials();

        if let Some(token) = credentials.token {
            return Ok(Credential::Bearer(token));
        }

        if let Some(current) = credentials.guest {
            if current.session_key != stale && !current.is_expired_at(now) {
                debug!("guest session already replaced");

                return Ok(Credential::Guest(current.session_key));
            }
        }

        info!("replacing rejected guest session");

        let guest = self.issue_guest_session(now).await?;

        Ok(Credential::Guest(guest.session_key))
    }

    /// Forget the guest session.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails.
    pub fn clear_guest_session(&self) -> Result<(), SessionError> {
        self.storage.remove(GUEST_SESSION_KEY)?;

        Ok(())
    }

    /// Move the guest cart into the logged in user's cart, then forget the guest session.
    ///
    /// # Errors
    ///
    /// Returns an error when not logged in, when there is no guest session, or when the merge
    /// request fails. The guest session is kept on failure.
    pub async fn merge_guest_cart(&self) -> Result<(), SessionError> {
        let token = self
            .storage
            .get(AUTH_TOKEN_KEY)
            .ok_or(SessionError::NotAuthenticated)?;

        let guest = self.guest_session().ok_or(SessionError::NoGuestSession)?;

        self.api
            .merge_guest_cart(&token, &guest.session_key)
            .await?;

        self.clear_guest_session()?;

        info!("merged guest cart");

        Ok(())
    }

    /// Log in and store the tokens and profile.
    ///
    /// The guest session is left in place for the cart merge.
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials are rejected, the profile cannot be fetched, or
    /// storage fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let tokens = self.api.obtain_token(email, password).await?;
        let user = self.api.current_user(&tokens.access).await?;
        let profile = serde_json::to_string(&user).map_err(StorageError::from)?;

        self.storage.set(AUTH_TOKEN_KEY, &tokens.access)?;
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;
        self.storage.set(USER_KEY, &profile)?;

        info!(user = user.id, "logged in");

        Ok(user)
    }

    /// Swap the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no refresh token or it is rejected. Either way every
    /// piece of auth state is cleared.
    pub async fn refresh_access_token(&self) -> Result<String, SessionError> {
        let Some(refresh) = self.storage.get(REFRESH_TOKEN_KEY) else {
            self.clear_auth()?;

            return Err(SessionError::NoRefreshToken);
        };

        match self.api.refresh_token(&refresh).await {
            Ok(access) => {
                self.storage.set(AUTH_TOKEN_KEY, &access)?;

                debug!("refreshed access token");

                Ok(access)
            }
            Err(error) => {
                warn!("token refresh failed: {error}");

                self.clear_auth()?;

                Err(error.into())
            }
        }
    }

    /// Log out. The guest session survives so the shopper can carry on.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.clear_auth()?;

        info!("logged out");

        Ok(())
    }

    /// Replace an expired guest session. Returns whether it was replaced.
    ///
    /// # Errors
    ///
    /// Returns an error when a new guest session cannot be issued or stored.
    pub async fn check_expiry(&self) -> Result<bool, SessionError> {
        self.check_expiry_at(Timestamp::now()).await
    }

    pub(crate) async fn check_expiry_at(&self, now: Timestamp) -> Result<bool, SessionError> {
        if self.is_authenticated() {
            return Ok(false);
        }

        let Some(guest) = self.guest_session() else {
            return Ok(false);
        };

        if !guest.is_expired_at(now) {
            return Ok(false);
        }

        info!(expired_at = %guest.expires_at, "guest session expired");

        let _bootstrap = self.bootstrap.lock().await;

        if self.guest_session() != Some(guest) {
            return Ok(false);
        }

        self.clear_guest_session()?;
        self.issue_guest_session(now).await?;

        Ok(true)
    }

    async fn issue_guest_session(&self, now: Timestamp) -> Result<GuestSession, SessionError> {
        let guest = self.issuer.issue(now).await?;
        let stored = serde_json::to_string(&guest).map_err(StorageError::from)?;

        self.storage.set(GUEST_SESSION_KEY, &stored)?;

        info!(expires_at = %guest.expires_at, "started guest session");

        Ok(guest)
    }

    fn clear_auth(&self) -> Result<(), StorageError> {
        self.storage.remove(AUTH_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }

    fn discard_expired_guest(&self, now: Timestamp) {
        let Some(guest) = self.guest_session() else {
            return;
        };

        if !guest.is_expired_at(now) {
            return;
        }

        info!(expired_at = %guest.expires_at, "discarding expired guest session");

        if let Err(error) = self.storage.remove(GUEST_SESSION_KEY) {
            warn!("failed to discard expired guest session: {error}");
        }
    }
}
