//! Larder client services: credential storage, the shop API, sessions and the cart store.

pub mod config;
pub mod context;
pub mod domain;
pub mod http;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod test;
