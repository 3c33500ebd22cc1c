//! Cart line items

use std::fmt::{Display, Formatter, Result as FmtResult};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ingredients::{Ingredient, IngredientId};

/// Server-assigned cart item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(u64);

impl CartItemId {
    /// Wrap a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CartItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for CartItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// One ingredient-and-quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Server identifier; `None` while the line only exists locally.
    #[serde(default)]
    pub id: Option<CartItemId>,

    /// The ingredient on this line
    pub ingredient: Ingredient,

    /// Number of units
    pub quantity: u32,
}

impl CartLineItem {
    /// Create a line that has not been persisted yet.
    pub fn provisional(ingredient: Ingredient, quantity: u32) -> Self {
        Self {
            id: None,
            ingredient,
            quantity,
        }
    }

    /// Create a line for a persisted cart item.
    pub fn persisted(id: CartItemId, ingredient: Ingredient, quantity: u32) -> Self {
        Self {
            id: Some(id),
            ingredient,
            quantity,
        }
    }

    /// Ingredient identifier of the line.
    pub fn ingredient_id(&self) -> IngredientId {
        self.ingredient.id
    }

    /// Unit price multiplied by quantity, saturating at the `Decimal` bounds.
    pub fn line_total(&self) -> Decimal {
        self.ingredient
            .price
            .saturating_mul(Decimal::from(self.quantity))
    }

    /// Whether the server has assigned an identifier to this line.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Sum of all line totals, saturating at the `Decimal` bounds.
pub fn total_price(items: &[CartLineItem]) -> Decimal {
    items
        .iter()
        .map(CartLineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of all quantities.
pub fn total_items(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}
