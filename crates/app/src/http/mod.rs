//! HTTP plumbing shared by the shop and auth API clients.

mod client;
mod errors;
pub mod routes;

pub use client::ApiClient;
pub use errors::{ApiError, extract_error_message};

#[cfg(test)]
pub(crate) mod testing;
