//! Larder
//!
//! Larder is the client-side cart and session core of the recipe-and-grocery shop: line items,
//! cart totals, the cart reducer and the credential selection policy.

pub mod cart;
pub mod credentials;
pub mod guest;
pub mod ingredients;
pub mod items;
pub mod prelude;
pub mod reducer;
