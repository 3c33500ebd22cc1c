//! Carts
//!
//! Optimistic local cart state reconciled against the shop API.

mod api;
mod errors;
mod notices;
mod store;

pub use api::{CartApi, HttpCartApi, MockCartApi};
pub use errors::CartError;
pub use notices::{Notice, NoticeLevel};
pub use store::CartStore;
