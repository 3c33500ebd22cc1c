//! Cart state

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::items::{CartItemId, CartLineItem, total_items, total_price};

/// Cart payload as returned by `GET /api/shop/platform-ingredients-cart/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items
    #[serde(default)]
    pub items: Vec<CartLineItem>,

    /// Server-computed total price
    #[serde(default)]
    pub total_price: Decimal,

    /// Server-computed item count
    #[serde(default)]
    pub total_items: u64,
}

impl CartSnapshot {
    /// Snapshot of a cart that does not exist yet, or was just cleared.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot whose totals are computed from `items`.
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        Self {
            total_price: total_price(&items),
            total_items: total_items(&items),
            items,
        }
    }
}

/// Coarse cart status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    /// Nothing fetched yet.
    Idle,

    /// A request is in flight.
    Loading,

    /// The last request failed. Items are the last known good list.
    Error,

    /// Items reflect the last server response or local edits on top of it.
    Ready,
}

/// Local cart state.
///
/// `total_price` and `total_items` are always derived from `items`, so
/// `total_price == Σ price × quantity` and `total_items == Σ quantity` hold after every
/// transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    items: Vec<CartLineItem>,
    total_price: Decimal,
    total_items: u64,
    loading: bool,
    loaded: bool,
    error: Option<String>,
}

impl CartState {
    /// Empty cart that has never been fetched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Total price of all lines.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Total quantity of all lines.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last error message, if the last request failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Derived status.
    pub fn status(&self) -> CartStatus {
        if self.loading {
            CartStatus::Loading
        } else if self.error.is_some() {
            CartStatus::Error
        } else if self.loaded {
            CartStatus::Ready
        } else {
            CartStatus::Idle
        }
    }

    /// Find a line by its server identifier.
    pub fn item(&self, id: CartItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<CartLineItem> {
        &mut self.items
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub(crate) fn replace_items(&mut self, items: Vec<CartLineItem>) {
        self.items = items;
        self.recompute_totals();
    }

    pub(crate) fn recompute_totals(&mut self) {
        self.total_price = total_price(&self.items);
        self.total_items = total_items(&self.items);
    }
}
