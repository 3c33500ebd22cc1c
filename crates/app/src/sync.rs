//! Background session upkeep.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        oneshot,
    },
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{domain::carts::CartStore, storage::StorageEvent};

/// Keeps the cart in step with session changes.
///
/// Replaces an expired guest session on every tick, and re-fetches the cart whenever another
/// storage handle changes the credential. A token appearing next to a guest session triggers
/// the guest cart merge first.
#[derive(Debug)]
pub struct SessionSync {
    cart: Arc<CartStore>,
    events: broadcast::Receiver<StorageEvent>,
    expiry_check_interval: Duration,
}

impl SessionSync {
    /// Storage events are collected from here on, even before the task runs.
    #[must_use]
    pub fn new(cart: Arc<CartStore>, expiry_check_interval: Duration) -> Self {
        let events = cart.sessions().storage().subscribe();

        Self {
            cart,
            events,
            expiry_check_interval,
        }
    }

    /// Run on a new task until `shutdown` fires or is dropped.
    pub fn spawn(self, shutdown: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.expiry_check_interval,
            self.expiry_check_interval,
        );

        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("session sync started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.check_expiry().await,
                event = self.events.recv() => match event {
                    Ok(event) => self.on_storage_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed storage events, re-fetching cart");

                        self.cart.fetch_cart().await;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        debug!("session sync stopped");
    }

    async fn check_expiry(&self) {
        match self.cart.sessions().check_expiry().await {
            Ok(true) => {
                info!("guest session renewed, reloading cart");

                self.cart.reset();
                self.cart.fetch_cart().await;
            }
            Ok(false) => {}
            Err(error) => {
                warn!("failed to renew expired guest session: {error}");

                self.cart.reset();
            }
        }
    }

    async fn on_storage_event(&self, event: &StorageEvent) {
        if !event.affects_credentials() {
            return;
        }

        debug!(key = %event.key, "credentials changed elsewhere");

        let sessions = self.cart.sessions();

        if sessions.is_authenticated() && sessions.has_guest_session() {
            self.cart.sync_after_login().await;
        } else {
            self.cart.fetch_cart().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;
    use tokio::sync::{oneshot, watch};

    use crate::{
        domain::{carts::MockCartApi, sessions::MockSessionApi},
        storage::{AUTH_TOKEN_KEY, CredentialStorage, MemoryStorage, USER_KEY},
        test::{
            context::TestContext,
            helpers::{issuing, line, live_guest, never_issuing, snapshot, store_guest},
        },
    };

    use super::*;

    async fn changed(
        changes: &mut watch::Receiver<larder::cart::CartState>,
    ) -> TestResult<larder::cart::CartState> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                changes.changed().await?;

                let state = changes.borrow_and_update().clone();

                if !state.is_loading() {
                    return Ok::<_, watch::error::RecvError>(state);
                }
            }
        })
        .await?
        .map_err(Into::into)
    }

    #[tokio::test]
    async fn test_login_in_other_tab_refetches_cart() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let other_tab = storage.open_tab();

        let mut api = MockCartApi::new();

        api.expect_get_cart()
            .once()
            .withf(|credential| {
                matches!(credential, larder::credentials::Credential::Bearer(token) if token == "t-1")
            })
            .returning(|_| Ok(snapshot(vec![line(7, 42, 2)])));

        let ctx = TestContext::on_storage(storage, api, MockSessionApi::new(), never_issuing());
        let mut changes = ctx.cart.subscribe();
        let (stop, shutdown) = oneshot::channel();
        let task = SessionSync::new(ctx.cart.clone(), Duration::from_secs(3600)).spawn(shutdown);

        other_tab.set(AUTH_TOKEN_KEY, "t-1")?;

        let state = changed(&mut changes).await?;

        assert_eq!(state.total_items(), 2);

        stop.send(()).ok();
        task.await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_token_next_to_guest_session_merges_first() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let other_tab = storage.open_tab();

        store_guest(&*storage, &live_guest("g-1")?)?;

        let mut sessions = MockSessionApi::new();
        let mut api = MockCartApi::new();

        sessions
            .expect_merge_guest_cart()
            .once()
            .withf(|token, key| token == "t-1" && key == "g-1")
            .returning(|_, _| Ok(()));

        api.expect_get_cart()
            .once()
            .returning(|_| Ok(snapshot(vec![line(7, 42, 5)])));

        let ctx = TestContext::on_storage(storage, api, sessions, never_issuing());
        let mut changes = ctx.cart.subscribe();
        let (stop, shutdown) = oneshot::channel();
        let task = SessionSync::new(ctx.cart.clone(), Duration::from_secs(3600)).spawn(shutdown);

        other_tab.set(AUTH_TOKEN_KEY, "t-1")?;

        let state = changed(&mut changes).await?;

        assert_eq!(state.total_items(), 5);
        assert!(!ctx.sessions.has_guest_session());

        stop.send(()).ok();
        task.await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_unrelated_keys_are_ignored() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let other_tab = storage.open_tab();

        let mut api = MockCartApi::new();

        api.expect_get_cart().never();

        let ctx = TestContext::on_storage(storage, api, MockSessionApi::new(), never_issuing());
        let (stop, shutdown) = oneshot::channel();
        let task = SessionSync::new(ctx.cart.clone(), Duration::from_secs(3600)).spawn(shutdown);

        other_tab.set(USER_KEY, "{}")?;
        tokio::task::yield_now().await;

        stop.send(()).ok();
        task.await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_expired_guest_session_is_renewed_on_tick() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());
        let soon = jiff::Timestamp::now().checked_add(jiff::SignedDuration::from_millis(50))?;

        store_guest(
            &*storage,
            &larder::credentials::GuestSession::new("g-1", soon),
        )?;

        let mut api = MockCartApi::new();

        api.expect_get_cart()
            .once()
            .withf(|credential| {
                matches!(credential, larder::credentials::Credential::Guest(key) if key == "g-2")
            })
            .returning(|_| Ok(snapshot(Vec::new())));

        let ctx = TestContext::on_storage(storage, api, MockSessionApi::new(), issuing("g-2"));
        let mut changes = ctx.cart.subscribe();
        let (stop, shutdown) = oneshot::channel();
        let task = SessionSync::new(ctx.cart.clone(), Duration::from_millis(100)).spawn(shutdown);

        let state = changed(&mut changes).await?;

        assert!(state.is_empty());
        assert_eq!(
            ctx.sessions.guest_session().map(|guest| guest.session_key).as_deref(),
            Some("g-2")
        );

        stop.send(()).ok();
        task.await?;

        Ok(())
    }
}
