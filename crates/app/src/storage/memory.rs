//! In-process storage shared between handles.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tokio::sync::broadcast;
use tracing::trace;

use super::{CredentialStorage, StorageError, StorageEvent, event_channel};

#[derive(Debug, Default)]
struct Shared {
    values: RwLock<HashMap<String, String>>,
    tabs: RwLock<Vec<broadcast::Sender<StorageEvent>>>,
}

/// In-memory [`CredentialStorage`].
///
/// Every handle returned by [`MemoryStorage::open_tab`] sees the same values and is notified of
/// writes made through the others, never of its own.
#[derive(Debug)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    /// Create empty storage with a single handle.
    #[must_use]
    pub fn new() -> Self {
        Self::attach(Arc::new(Shared::default()))
    }

    /// Open another handle onto the same storage.
    #[must_use]
    pub fn open_tab(&self) -> Self {
        Self::attach(Arc::clone(&self.shared))
    }

    fn attach(shared: Arc<Shared>) -> Self {
        let events = event_channel();

        shared
            .tabs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(events.clone());

        Self { shared, events }
    }

    fn announce(&self, key: &str) {
        let tabs = self
            .shared
            .tabs
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        for tab in tabs.iter().filter(|tab| !tab.same_channel(&self.events)) {
            if tab
                .send(StorageEvent {
                    key: key.to_string(),
                })
                .is_err()
            {
                trace!(key, "no listeners on storage tab");
            }
        }
    }
}

impl Drop for MemoryStorage {
    fn drop(&mut self) {
        self.shared
            .tabs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tab| !tab.same_channel(&self.events));
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.shared
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.shared
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        self.announce(key);

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = self
            .shared
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        if removed.is_some() {
            self.announce(key);
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
