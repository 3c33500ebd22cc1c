//! Cart reducer
//!
//! Every change to [`CartState`] is expressed as a [`CartAction`] and applied by [`reduce`].
//! Local edits recompute totals from the full line list; server snapshots replace the list.

use crate::{
    cart::{CartSnapshot, CartState},
    items::{CartItemId, CartLineItem},
};

/// A cart state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// A request started or finished.
    SetLoading(bool),

    /// Record (or clear) the last error. Ends any loading.
    SetError(Option<String>),

    /// Replace local state with an authoritative server snapshot.
    SetCart(CartSnapshot),

    /// Merge a line into the cart. Quantities add up when the ingredient is already present.
    AddItem(CartLineItem),

    /// Replace the line for the same ingredient with the server's version of it.
    ConfirmItem(CartLineItem),

    /// Set the quantity of a persisted line.
    UpdateItem {
        /// Line to update
        id: CartItemId,

        /// New quantity
        quantity: u32,
    },

    /// Drop a persisted line.
    RemoveItem(CartItemId),

    /// Empty the cart, keeping it marked as loaded.
    Clear,

    /// Return to the never-fetched state.
    Reset,
}

/// Apply `action` to `state`.
pub fn reduce(state: &mut CartState, action: CartAction) {
    match action {
        CartAction::SetLoading(loading) => state.set_loading(loading),
        CartAction::SetError(error) => {
            state.set_error(error);
            state.set_loading(false);
        }
        CartAction::SetCart(snapshot) => {
            state.replace_items(snapshot.items);
            state.set_loading(false);
            state.set_error(None);
            state.mark_loaded();
        }
        CartAction::AddItem(line) => {
            let items = state.items_mut();

            if let Some(existing) = items
                .iter_mut()
                .find(|item| item.ingredient_id() == line.ingredient_id())
            {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                items.push(line);
            }

            state.recompute_totals();
            state.set_error(None);
        }
        CartAction::ConfirmItem(line) => {
            let items = state.items_mut();

            if let Some(existing) = items
                .iter_mut()
                .find(|item| item.ingredient_id() == line.ingredient_id())
            {
                *existing = line;
            } else {
                items.push(line);
            }

            state.recompute_totals();
        }
        CartAction::UpdateItem { id, quantity } => {
            if let Some(existing) = state
                .items_mut()
                .iter_mut()
                .find(|item| item.id == Some(id))
            {
                existing.quantity = quantity;
            }

            state.recompute_totals();
        }
        CartAction::RemoveItem(id) => {
            state.items_mut().retain(|item| item.id != Some(id));
            state.recompute_totals();
        }
        CartAction::Clear => {
            state.replace_items(Vec::new());
            state.set_loading(false);
            state.set_error(None);
            state.mark_loaded();
        }
        CartAction::Reset => *state = CartState::new(),
    }
}
