//! Sessions
//!
//! Who the client is acting as: a logged in user, an anonymous guest, or nobody yet.

mod api;
mod errors;
mod issuer;
pub mod models;
mod service;

pub use api::{HttpSessionApi, MockSessionApi, SessionApi};
pub use errors::SessionError;
pub use issuer::{GuestSessionIssuer, LocalGuestSessions, MockGuestSessionIssuer, RemoteGuestSessions};
pub use service::SessionService;
