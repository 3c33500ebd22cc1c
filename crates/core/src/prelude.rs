//! Larder prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartSnapshot, CartState, CartStatus},
    credentials::{
        AUTHORIZATION_HEADER, Credential, Credentials, GUEST_SESSION_HEADER, GuestSession,
    },
    guest::{generate_guest_session_key, new_guest_session},
    ingredients::{Ingredient, IngredientId},
    items::{CartItemId, CartLineItem},
    reducer::{CartAction, reduce},
};
