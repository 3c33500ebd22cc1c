//! Credential storage
//!
//! Persistent key/value storage shared between client instances, the analogue of browser local
//! storage shared between tabs. Writes made through one handle are announced to every other
//! handle as [`StorageEvent`]s.

use std::fmt::Debug;

use thiserror::Error;
use tokio::sync::broadcast;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Access token of the logged in user.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Refresh token of the logged in user.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// JSON-encoded profile of the logged in user.
pub const USER_KEY: &str = "user";

/// JSON-encoded guest session.
pub const GUEST_SESSION_KEY: &str = "guest_session";

const EVENT_CAPACITY: usize = 64;

/// A key changed through another storage handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that was set or removed
    pub key: String,
}

impl StorageEvent {
    /// Whether the change affects which credential requests are made with.
    pub fn affects_credentials(&self) -> bool {
        self.key == AUTH_TOKEN_KEY || self.key == GUEST_SESSION_KEY
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o error")]
    Io(#[from] std::io::Error),

    /// The stored data could not be encoded or decoded.
    #[error("storage encoding error")]
    Json(#[from] serde_json::Error),
}

/// Shared key/value credential storage.
pub trait CredentialStorage: Debug + Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails to persist the value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails to persist the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to changes made through other handles.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

fn event_channel() -> broadcast::Sender<StorageEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}
