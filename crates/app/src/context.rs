//! App Context

use std::sync::Arc;

use thiserror::Error;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    config::{ClientConfig, GuestSessionSource},
    domain::{
        carts::{CartApi, CartStore, HttpCartApi},
        sessions::{
            GuestSessionIssuer, HttpSessionApi, LocalGuestSessions, RemoteGuestSessions,
            SessionApi, SessionError, SessionService, models::User,
        },
    },
    http::{ApiClient, ApiError},
    storage::{CredentialStorage, FileStorage, MemoryStorage, StorageError},
    sync::SessionSync,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build http client")]
    Http(#[source] ApiError),

    #[error("failed to open credential storage")]
    Storage(#[source] StorageError),
}

/// Handle to a running [`SessionSync`] task.
#[derive(Debug)]
pub struct SyncHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
    watcher: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop background work and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error when the sync task panicked.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        if self.stop.send(()).is_err() {
            debug!("session sync already stopped");
        }

        if let Some(watcher) = self.watcher {
            watcher.abort();
        }

        self.task.await
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub sessions: Arc<SessionService>,
    pub cart: Arc<CartStore>,
    file_storage: Option<Arc<FileStorage>>,
    config: ClientConfig,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built or the credential file cannot be
    /// read.
    pub fn from_config(config: ClientConfig) -> Result<Self, AppInitError> {
        let client = ApiClient::new(&config.base_url, config.request_timeout)
            .map_err(AppInitError::Http)?;

        let file_storage = match &config.storage_path {
            Some(path) => Some(Arc::new(
                FileStorage::open(path).map_err(AppInitError::Storage)?,
            )),
            None => None,
        };

        let storage: Arc<dyn CredentialStorage> = match &file_storage {
            Some(file) => file.clone(),
            None => Arc::new(MemoryStorage::new()),
        };

        let session_api: Arc<dyn SessionApi> = Arc::new(HttpSessionApi::new(client.clone()));

        let issuer: Arc<dyn GuestSessionIssuer> = match config.guest_sessions {
            GuestSessionSource::Local => Arc::new(LocalGuestSessions),
            GuestSessionSource::Server => Arc::new(RemoteGuestSessions::new(session_api.clone())),
        };

        info!(
            base_url = client.base_url(),
            guest_sessions = ?config.guest_sessions,
            "initialized app context"
        );

        let mut context = Self::from_parts(
            session_api,
            Arc::new(HttpCartApi::new(client)),
            issuer,
            storage,
            config,
        );

        context.file_storage = file_storage;

        Ok(context)
    }

    /// Build application context from already constructed services.
    pub fn from_parts(
        session_api: Arc<dyn SessionApi>,
        cart_api: Arc<dyn CartApi>,
        issuer: Arc<dyn GuestSessionIssuer>,
        storage: Arc<dyn CredentialStorage>,
        config: ClientConfig,
    ) -> Self {
        let sessions = Arc::new(SessionService::new(session_api, issuer, storage));

        Self {
            cart: Arc::new(CartStore::new(cart_api, sessions.clone())),
            sessions,
            file_storage: None,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Load the cart for whoever the stored credentials say we are, merging a leftover guest
    /// cart first when already logged in.
    pub async fn restore(&self) {
        if self.sessions.is_authenticated() && self.sessions.has_guest_session() {
            self.cart.sync_after_login().await;
        } else {
            self.cart.fetch_cart().await;
        }
    }

    /// Log in, merge any guest cart and load the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error when the login itself fails. Merge failures are logged only.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let user = self.sessions.login(email, password).await?;

        self.cart.sync_after_login().await;

        Ok(user)
    }

    /// Log out and fall back to the guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error when credential storage fails.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.sessions.logout()?;
        self.cart.reset();
        self.cart.fetch_cart().await;

        Ok(())
    }

    /// Start background session upkeep, and file polling when credentials live in a file.
    pub fn spawn_sync(&self) -> SyncHandle {
        let (stop, shutdown) = oneshot::channel();

        let watcher = self
            .file_storage
            .as_ref()
            .map(|file| file.spawn_watcher(self.config.storage_poll_interval));

        let task = SessionSync::new(self.cart.clone(), self.config.expiry_check_interval)
            .spawn(shutdown);

        SyncHandle {
            stop,
            task,
            watcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use larder::credentials::Credential;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::MockCartApi,
            sessions::{MockGuestSessionIssuer, MockSessionApi, models::TokenPair},
        },
        storage::{AUTH_TOKEN_KEY, GUEST_SESSION_KEY},
        test::helpers::{issuing, line, live_guest, never_issuing, snapshot, store_guest, user},
    };

    use super::*;

    fn context(
        sessions: MockSessionApi,
        cart: MockCartApi,
        issuer: MockGuestSessionIssuer,
        storage: Arc<MemoryStorage>,
    ) -> AppContext {
        AppContext::from_parts(
            Arc::new(sessions),
            Arc::new(cart),
            Arc::new(issuer),
            storage,
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_login_merges_guest_cart_then_fetches() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        store_guest(&*storage, &live_guest("g-1")?)?;

        let mut sessions = MockSessionApi::new();
        let mut cart = MockCartApi::new();
        let mut sequence = mockall::Sequence::new();

        sessions
            .expect_obtain_token()
            .once()
            .in_sequence(&mut sequence)
            .returning(|_, _| {
                Ok(TokenPair {
                    access: "t-1".to_string(),
                    refresh: "r-1".to_string(),
                })
            });
        sessions
            .expect_current_user()
            .once()
            .in_sequence(&mut sequence)
            .returning(|_| Ok(user()));
        sessions
            .expect_merge_guest_cart()
            .once()
            .in_sequence(&mut sequence)
            .withf(|token, key| token == "t-1" && key == "g-1")
            .returning(|_, _| Ok(()));
        cart.expect_get_cart()
            .once()
            .in_sequence(&mut sequence)
            .withf(|credential| matches!(credential, Credential::Bearer(token) if token == "t-1"))
            .returning(|_| Ok(snapshot(vec![line(7, 42, 3), line(8, 43, 2)])));

        let app = context(sessions, cart, never_issuing(), storage.clone());

        let logged_in = app.login("cook@example.com", "secret").await?;

        assert_eq!(logged_in, user());
        assert_eq!(app.cart.state().total_items(), 5);
        assert_eq!(storage.get(GUEST_SESSION_KEY), None);

        Ok(())
    }

    #[tokio::test]
    async fn test_login_survives_failed_merge() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        store_guest(&*storage, &live_guest("g-1")?)?;

        let mut sessions = MockSessionApi::new();
        let mut cart = MockCartApi::new();

        sessions.expect_obtain_token().once().returning(|_, _| {
            Ok(TokenPair {
                access: "t-1".to_string(),
                refresh: "r-1".to_string(),
            })
        });
        sessions.expect_current_user().once().returning(|_| Ok(user()));
        sessions.expect_merge_guest_cart().once().returning(|_, _| {
            Err(ApiError::Status {
                status: 500,
                message: None,
            })
        });
        cart.expect_get_cart()
            .once()
            .returning(|_| Ok(snapshot(vec![line(7, 42, 1)])));

        let app = context(sessions, cart, never_issuing(), storage.clone());

        app.login("cook@example.com", "secret").await?;

        assert_eq!(app.cart.state().total_items(), 1);
        assert!(app.sessions.has_guest_session());

        Ok(())
    }

    #[tokio::test]
    async fn test_logout_falls_back_to_guest_cart() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(AUTH_TOKEN_KEY, "t-1")?;

        let mut cart = MockCartApi::new();

        cart.expect_get_cart()
            .once()
            .withf(|credential| matches!(credential, Credential::Guest(key) if key == "g-9"))
            .returning(|_| Ok(snapshot(Vec::new())));

        let app = context(MockSessionApi::new(), cart, issuing("g-9"), storage);

        app.logout().await?;

        assert!(!app.sessions.is_authenticated());
        assert!(app.cart.state().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_login_in_another_process_refetches_cart() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");

        let ours = Arc::new(FileStorage::open(&path)?);
        let theirs = FileStorage::open(&path)?;

        let mut cart = MockCartApi::new();

        cart.expect_get_cart()
            .once()
            .withf(|credential| matches!(credential, Credential::Bearer(token) if token == "t-2"))
            .returning(|_| Ok(snapshot(vec![line(7, 42, 2)])));

        let mut app = AppContext::from_parts(
            Arc::new(MockSessionApi::new()),
            Arc::new(cart),
            Arc::new(never_issuing()),
            ours.clone(),
            ClientConfig {
                storage_path: Some(path),
                storage_poll_interval: Duration::from_millis(10),
                ..ClientConfig::default()
            },
        );

        app.file_storage = Some(ours);

        let mut changes = app.cart.subscribe();
        let handle = app.spawn_sync();

        theirs.set(AUTH_TOKEN_KEY, "t-2")?;

        tokio::time::timeout(
            Duration::from_secs(5),
            changes.wait_for(|state| state.total_items() == 2),
        )
        .await??;

        assert!(app.sessions.is_authenticated());

        handle.shutdown().await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_from_config_uses_file_storage() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");

        FileStorage::open(&path)?.set(AUTH_TOKEN_KEY, "t-1")?;

        let app = AppContext::from_config(ClientConfig {
            storage_path: Some(path),
            ..ClientConfig::default()
        })?;

        assert_eq!(app.sessions.credential(), Some(Credential::Bearer("t-1".to_string())));

        let handle = app.spawn_sync();

        handle.shutdown().await?;

        Ok(())
    }
}
