//! Larder Domain Concerns

pub mod carts;
pub mod sessions;
