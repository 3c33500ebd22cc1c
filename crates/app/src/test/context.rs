//! Test context wiring mocked APIs to real services over in-memory storage.

use std::sync::Arc;

use crate::{
    domain::{
        carts::{CartStore, MockCartApi},
        sessions::{GuestSessionIssuer, MockSessionApi, SessionService},
    },
    storage::MemoryStorage,
};

pub(crate) struct TestContext {
    pub storage: Arc<MemoryStorage>,
    pub sessions: Arc<SessionService>,
    pub cart: Arc<CartStore>,
}

impl TestContext {
    /// Context whose session API must not be called.
    pub fn new(cart: MockCartApi, issuer: impl GuestSessionIssuer + 'static) -> Self {
        Self::with_session_api(cart, strict_session_api(), issuer)
    }

    pub fn with_session_api(
        cart: MockCartApi,
        sessions: MockSessionApi,
        issuer: impl GuestSessionIssuer + 'static,
    ) -> Self {
        Self::on_storage(Arc::new(MemoryStorage::new()), cart, sessions, issuer)
    }

    /// Context sharing `storage` with other contexts, like a second browser tab.
    pub fn on_storage(
        storage: Arc<MemoryStorage>,
        cart: MockCartApi,
        sessions: MockSessionApi,
        issuer: impl GuestSessionIssuer + 'static,
    ) -> Self {
        let session_service = Arc::new(SessionService::new(
            Arc::new(sessions),
            Arc::new(issuer),
            storage.clone(),
        ));

        Self {
            cart: Arc::new(CartStore::new(Arc::new(cart), session_service.clone())),
            sessions: session_service,
            storage,
        }
    }
}

fn strict_session_api() -> MockSessionApi {
    let mut sessions = MockSessionApi::new();

    sessions.expect_create_guest_session().never();
    sessions.expect_merge_guest_cart().never();
    sessions.expect_obtain_token().never();
    sessions.expect_refresh_token().never();
    sessions.expect_current_user().never();

    sessions
}
