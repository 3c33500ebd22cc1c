//! Shared fixtures for service tests.

pub(crate) mod context;
pub(crate) mod helpers;
