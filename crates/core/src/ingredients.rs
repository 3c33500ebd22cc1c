//! Ingredients

use std::fmt::{Display, Formatter, Result as FmtResult};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Platform ingredient identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientId(u64);

impl IngredientId {
    /// Wrap a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for IngredientId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for IngredientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// An ingredient sold by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient identifier
    pub id: IngredientId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unit price. The API encodes decimals as strings; plain numbers are accepted too.
    pub price: Decimal,

    /// Sale unit, e.g. `"kg"`
    #[serde(default)]
    pub unit: String,

    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
}

impl Ingredient {
    /// Create an ingredient with no image.
    pub fn new(
        id: IngredientId,
        name: impl Into<String>,
        price: Decimal,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            unit: unit.into(),
            image: None,
        }
    }

    /// Stand-in used for an optimistic line when the ingredient details are not known yet.
    ///
    /// It carries a zero price so cart totals stay consistent until the server answers.
    pub fn placeholder(id: IngredientId) -> Self {
        Self::new(id, String::new(), Decimal::ZERO, String::new())
    }
}
