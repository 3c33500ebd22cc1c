//! Fixture builders.

use jiff::{SignedDuration, Timestamp};
use larder::{
    cart::CartSnapshot,
    credentials::GuestSession,
    ingredients::{Ingredient, IngredientId},
    items::{CartItemId, CartLineItem},
};
use rust_decimal::Decimal;

use crate::{
    domain::sessions::{MockGuestSessionIssuer, models::User},
    http::ApiError,
    storage::{CredentialStorage, GUEST_SESSION_KEY, StorageError},
};

pub(crate) fn basil() -> Ingredient {
    Ingredient::new(IngredientId::new(42), "Basil", Decimal::new(250, 2), "bunch")
}

/// Persisted line for `ingredient` at 2.50 a unit.
pub(crate) fn line(id: u64, ingredient: u64, quantity: u32) -> CartLineItem {
    let ingredient = Ingredient::new(
        IngredientId::new(ingredient),
        format!("Ingredient {ingredient}"),
        Decimal::new(250, 2),
        "unit",
    );

    CartLineItem::persisted(CartItemId::new(id), ingredient, quantity)
}

pub(crate) fn snapshot(items: Vec<CartLineItem>) -> CartSnapshot {
    CartSnapshot::from_items(items)
}

pub(crate) fn status(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: None,
    }
}

pub(crate) fn user() -> User {
    User {
        id: 4,
        email: "cook@example.com".to_string(),
        username: Some("cook".to_string()),
        role: None,
    }
}

/// Guest session valid for another hour.
pub(crate) fn live_guest(key: &str) -> Result<GuestSession, jiff::Error> {
    Ok(GuestSession::new(
        key,
        Timestamp::now().checked_add(SignedDuration::from_hours(1))?,
    ))
}

/// Guest session that expired an hour ago.
pub(crate) fn expired_guest(key: &str) -> Result<GuestSession, jiff::Error> {
    Ok(GuestSession::new(
        key,
        Timestamp::now().checked_sub(SignedDuration::from_hours(1))?,
    ))
}

pub(crate) fn store_guest(
    storage: &dyn CredentialStorage,
    guest: &GuestSession,
) -> Result<(), StorageError> {
    storage.set(GUEST_SESSION_KEY, &serde_json::to_string(guest)?)
}

/// Issuer expected to hand out exactly one session, keyed `key`.
pub(crate) fn issuing(key: &'static str) -> MockGuestSessionIssuer {
    let mut issuer = MockGuestSessionIssuer::new();

    issuer.expect_issue().once().returning(move |now| {
        Ok(GuestSession::new(
            key,
            now.checked_add(SignedDuration::from_hours(1))
                .unwrap_or(now),
        ))
    });

    issuer
}

pub(crate) fn never_issuing() -> MockGuestSessionIssuer {
    let mut issuer = MockGuestSessionIssuer::new();

    issuer.expect_issue().never();

    issuer
}
