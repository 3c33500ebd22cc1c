//! Cart store.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use larder::{
    cart::{CartSnapshot, CartState},
    credentials::Credential,
    ingredients::{Ingredient, IngredientId},
    items::{CartItemId, CartLineItem},
    reducer::{CartAction, reduce},
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use crate::{
    domain::{
        carts::{api::CartApi, errors::CartError, notices::Notice},
        sessions::SessionService,
    },
    http::ApiError,
};

const NOTICE_CAPACITY: usize = 32;

const SESSION_INIT_FAILED: &str = "Failed to initialize session";
const FETCH_FAILED: &str = "Failed to fetch cart";
const FETCH_FAILED_NOTICE: &str = "Failed to load cart";
const INGREDIENTS_FAILED: &str = "Failed to load ingredients";

/// When a mutation re-reads the cart from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refetch {
    AfterSuccess,
    AfterFailure,
}

/// An optimistic local change and how to settle it once the server answers.
struct Mutation<T> {
    optimistic: CartAction,
    confirm: fn(&T) -> Option<CartAction>,
    success: String,
    fallback: &'static str,
    refetch: Refetch,
}

/// Client-side cart.
///
/// Local edits are applied before the matching request is sent, then reconciled against the
/// server. Every state transition goes through [`reduce`] on a single watch channel so they
/// never interleave. Fetches are numbered as they start and a response is dropped when a later
/// fetch has already been applied.
pub struct CartStore {
    api: Arc<dyn CartApi>,
    sessions: Arc<SessionService>,
    state: watch::Sender<CartState>,
    notices: broadcast::Sender<Notice>,
    catalog: RwLock<HashMap<IngredientId, Ingredient>>,
    fetches_started: AtomicU64,
    fetches_applied: AtomicU64,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>, sessions: Arc<SessionService>) -> Self {
        Self {
            api,
            sessions,
            state: watch::Sender::new(CartState::new()),
            notices: broadcast::channel(NOTICE_CAPACITY).0,
            catalog: RwLock::new(HashMap::new()),
            fetches_started: AtomicU64::new(0),
            fetches_applied: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Watch every state transition.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Receive success and error notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn sessions(&self) -> &Arc<SessionService> {
        &self.sessions
    }

    /// Load the cart from the server.
    ///
    /// Failures are recorded in the state rather than returned. A guest session the server
    /// rejects is replaced once and the fetch retried; a cart that is still unauthorized, or
    /// does not exist, is shown as empty.
    pub async fn fetch_cart(&self) {
        let credential = match self.sessions.ensure_credential().await {
            Ok(credential) => credential,
            Err(error) => {
                warn!("failed to initialize session for cart fetch: {error}");

                self.dispatch(CartAction::SetError(Some(SESSION_INIT_FAILED.to_string())));

                return;
            }
        };

        let sequence = self.fetches_started.fetch_add(1, Ordering::SeqCst) + 1;

        self.dispatch(CartAction::SetLoading(true));

        let result = match self.api.get_cart(&credential).await {
            Err(error) if error.is_unauthorized() => match &credential {
                Credential::Guest(stale) => self.refetch_as_new_guest(stale, error).await,
                Credential::Bearer(_) => Err(error),
            },
            result => result,
        };

        match result {
            Ok(snapshot) => {
                debug!(items = snapshot.items.len(), "fetched cart");

                self.remember_ingredients(snapshot.items.iter().map(|line| &line.ingredient));
                self.apply_fetch(sequence, CartAction::SetCart(snapshot));
            }
            Err(error) if error.is_unauthorized() || error.is_not_found() => {
                debug!(status = error.status(), "no cart for credential, showing empty cart");

                self.apply_fetch(sequence, CartAction::SetCart(CartSnapshot::empty()));
            }
            Err(error) => {
                warn!("failed to fetch cart: {error}");

                let message = error.user_message(FETCH_FAILED);

                if self.apply_fetch(sequence, CartAction::SetError(Some(message))) {
                    self.notify(Notice::error(FETCH_FAILED_NOTICE));
                }
            }
        }
    }

    /// Add `quantity` units of an ingredient.
    ///
    /// The line shows up locally straight away. If the request fails it stays there until the
    /// next fetch replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero quantity, when no session can be started, or when the
    /// server rejects the request.
    pub async fn add_to_cart(
        &self,
        ingredient: IngredientId,
        quantity: u32,
    ) -> Result<CartLineItem, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let credential = match self.sessions.ensure_credential().await {
            Ok(credential) => credential,
            Err(error) => {
                warn!("failed to initialize session for add to cart: {error}");

                self.notify(Notice::error(SESSION_INIT_FAILED));

                return Err(CartError::SessionBootstrap(error));
            }
        };

        let line = CartLineItem::provisional(self.ingredient(ingredient), quantity);

        // Cleared by the refetch on success or by the error on failure.
        self.dispatch(CartAction::SetLoading(true));

        self.apply_then_confirm(
            Mutation {
                optimistic: CartAction::AddItem(line),
                confirm: |line: &CartLineItem| Some(CartAction::ConfirmItem(line.clone())),
                success: format!("Added {quantity} item(s) to cart"),
                fallback: "Failed to add item to cart",
                refetch: Refetch::AfterSuccess,
            },
            || self.api.add_item(&credential, ingredient, quantity),
        )
        .await
    }

    /// Set the quantity of a line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no session or the server rejects the request.
    pub async fn update_cart_item(&self, item: CartItemId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_from_cart(item).await;
        }

        let credential = self.existing_credential()?;

        self.apply_then_confirm(
            Mutation {
                optimistic: CartAction::UpdateItem { id: item, quantity },
                confirm: |_| None,
                success: "Cart updated".to_string(),
                fallback: "Failed to update cart item",
                refetch: Refetch::AfterFailure,
            },
            || self.api.update_item(&credential, item, quantity),
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no session or the server rejects the request.
    pub async fn remove_from_cart(&self, item: CartItemId) -> Result<(), CartError> {
        let credential = self.existing_credential()?;

        self.apply_then_confirm(
            Mutation {
                optimistic: CartAction::RemoveItem(item),
                confirm: |_| None,
                success: "Item removed from cart".to_string(),
                fallback: "Failed to remove cart item",
                refetch: Refetch::AfterFailure,
            },
            || self.api.remove_item(&credential, item),
        )
        .await
    }

    /// Empty the cart. Without a session only the local cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns an error when the server rejects the request.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let Some(credential) = self.sessions.credential() else {
            self.dispatch(CartAction::Clear);

            return Ok(());
        };

        self.apply_then_confirm(
            Mutation {
                optimistic: CartAction::Clear,
                confirm: |_| None,
                success: "Cart cleared".to_string(),
                fallback: "Failed to clear cart",
                refetch: Refetch::AfterFailure,
            },
            || self.api.clear(&credential),
        )
        .await
    }

    /// Drop all local state, e.g. after logout or session expiry.
    pub fn reset(&self) {
        self.dispatch(CartAction::Reset);
    }

    /// Fetch the ingredient catalog, remembering details for optimistic lines.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, CartError> {
        let ingredients = self
            .api
            .list_ingredients()
            .await
            .map_err(|source| CartError::request(source, INGREDIENTS_FAILED))?;

        self.remember_ingredients(ingredients.iter());

        Ok(ingredients)
    }

    /// Bring the cart in line after the user logged in.
    ///
    /// A pending guest cart is merged into the user's cart before the cart is fetched. A
    /// failed merge is logged and the user's own cart is fetched anyway.
    pub async fn sync_after_login(&self) {
        if self.sessions.is_authenticated() && self.sessions.has_guest_session() {
            if let Err(error) = self.sessions.merge_guest_cart().await {
                warn!("failed to merge guest cart: {error}");
            }
        }

        self.fetch_cart().await;
    }

    async fn apply_then_confirm<T, F, Fut>(
        &self,
        mutation: Mutation<T>,
        request: F,
    ) -> Result<T, CartError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Mutation {
            optimistic,
            confirm,
            success,
            fallback,
            refetch,
        } = mutation;

        self.dispatch(optimistic);

        match request().await {
            Ok(value) => {
                if let Some(action) = confirm(&value) {
                    self.dispatch(action);
                }

                if refetch == Refetch::AfterSuccess {
                    self.fetch_cart().await;
                }

                self.notify(Notice::success(success));

                Ok(value)
            }
            Err(source) => {
                warn!("cart request failed: {source}");

                if refetch == Refetch::AfterFailure {
                    self.fetch_cart().await;
                }

                let error = CartError::request(source, fallback);
                let message = error.message();

                self.dispatch(CartAction::SetError(Some(message.clone())));
                self.notify(Notice::error(message));

                Err(error)
            }
        }
    }

    async fn refetch_as_new_guest(
        &self,
        stale: &str,
        rejected: ApiError,
    ) -> Result<CartSnapshot, ApiError> {
        match self.sessions.reinitialize_guest_session(stale).await {
            Ok(credential) => {
                debug!("retrying cart fetch with new guest session");

                self.api.get_cart(&credential).await
            }
            Err(error) => {
                warn!("failed to replace rejected guest session: {error}");

                Err(rejected)
            }
        }
    }

    fn existing_credential(&self) -> Result<Credential, CartError> {
        self.sessions.credential().ok_or_else(|| {
            let error = CartError::SessionExpired;

            self.notify(Notice::error(error.message()));

            error
        })
    }

    fn dispatch(&self, action: CartAction) {
        trace!(?action, "cart action");

        self.state.send_modify(|state| reduce(state, action));
    }

    /// Apply the outcome of fetch number `sequence` unless a later fetch already landed.
    fn apply_fetch(&self, sequence: u64, action: CartAction) -> bool {
        self.state.send_if_modified(|state| {
            if self.fetches_applied.fetch_max(sequence, Ordering::SeqCst) > sequence {
                debug!(sequence, "discarding stale cart fetch");

                return false;
            }

            reduce(state, action);

            true
        })
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            trace!("no notice subscribers");
        }
    }

    fn ingredient(&self, id: IngredientId) -> Ingredient {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ingredient::placeholder(id))
    }

    fn remember_ingredients<'a>(&self, ingredients: impl Iterator<Item = &'a Ingredient>) {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);

        for ingredient in ingredients {
            catalog.insert(ingredient.id, ingredient.clone());
        }
    }
}
