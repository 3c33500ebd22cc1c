//! JSON file storage shared between processes.

use std::{
    collections::HashMap,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use fs_err as fs;
use tempfile::NamedTempFile;
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::{CredentialStorage, StorageError, StorageEvent, event_channel};

const DEFAULT_FILE_NAME: &str = "credentials.json";

/// [`CredentialStorage`] backed by a JSON file.
///
/// Values are cached in memory. Other processes writing the same file are picked up by the
/// task started with [`FileStorage::spawn_watcher`], which announces every key whose value
/// changed on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Open storage at `path`, loading any existing values.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = read_values(&path)?;

        debug!(path = %path.display(), keys = values.len(), "opened credential storage");

        Ok(Self {
            path,
            values: RwLock::new(values),
            events: event_channel(),
        })
    }

    /// Default location: `credentials.json` in the platform data directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("larder").join(DEFAULT_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file and announce keys changed by other writers.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn reload(&self) -> Result<Vec<String>, StorageError> {
        let on_disk = read_values(&self.path)?;

        let changed = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            let changed = changed_keys(&values, &on_disk);

            *values = on_disk;

            changed
        };

        self.announce(&changed);

        Ok(changed)
    }

    /// Poll the backing file every `interval` until the storage is dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let storage = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(storage) = storage.upgrade() else {
                    break;
                };

                match storage.reload() {
                    Ok(changed) if !changed.is_empty() => {
                        debug!(?changed, "credential storage changed on disk");
                    }
                    Ok(_) => {}
                    Err(error) => warn!("failed to reload credential storage: {error}"),
                }
            }
        })
    }

    /// Apply one key change on top of what is on disk now, then update the cache.
    ///
    /// Keys other writers changed since the last reload are kept and announced.
    fn write(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let mut on_disk = read_values(&self.path)?;
        let external: Vec<String> = changed_keys(&values, &on_disk)
            .into_iter()
            .filter(|changed| changed != key)
            .collect();

        let modified = match value {
            Some(value) => {
                let previous = on_disk.insert(key.to_string(), value.to_string());

                previous.as_deref() != Some(value)
            }
            None => on_disk.remove(key).is_some(),
        };

        if modified {
            self.persist(&on_disk)?;
        }

        *values = on_disk;
        drop(values);

        self.announce(&external);

        Ok(())
    }

    fn announce(&self, keys: &[String]) {
        for key in keys {
            if self
                .events
                .send(StorageEvent { key: key.clone() })
                .is_err()
            {
                trace!(key = %key, "no listeners on file storage");
            }
        }
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        fs::create_dir_all(parent)?;

        let mut temporary = NamedTempFile::new_in(parent)?;

        temporary.write_all(&serde_json::to_vec_pretty(values)?)?;
        temporary.persist(&self.path).map_err(io::Error::from)?;

        Ok(())
    }
}

impl CredentialStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, None)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

fn read_values(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(error) => Err(error.into()),
    }
}

fn changed_keys(before: &HashMap<String, String>, after: &HashMap<String, String>) -> Vec<String> {
    let mut changed: Vec<String> = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .chain(
            before
                .keys()
                .filter(|key| !after.contains_key(*key))
                .cloned(),
        )
        .collect();

    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::storage::{AUTH_TOKEN_KEY, GUEST_SESSION_KEY, USER_KEY};

    use super::*;

    #[test]
    fn values_survive_reopening() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("credentials.json");

        let storage = FileStorage::open(&path)?;
        storage.set(AUTH_TOKEN_KEY, "t-1")?;

        let reopened = FileStorage::open(&path)?;

        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("t-1"));

        Ok(())
    }

    #[test]
    fn missing_file_opens_empty() -> TestResult {
        let dir = tempfile::tempdir()?;

        let storage = FileStorage::open(dir.path().join("credentials.json"))?;

        assert_eq!(storage.get(AUTH_TOKEN_KEY), None);

        Ok(())
    }

    #[test]
    fn reload_announces_changes_from_other_writers() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");

        let ours = FileStorage::open(&path)?;
        let theirs = FileStorage::open(&path)?;
        let mut events = ours.subscribe();

        ours.set(USER_KEY, "{}")?;
        theirs.reload()?;
        theirs.set(AUTH_TOKEN_KEY, "t-2")?;
        theirs.set(GUEST_SESSION_KEY, "{}")?;

        let changed = ours.reload()?;

        assert_eq!(changed, [AUTH_TOKEN_KEY, GUEST_SESSION_KEY]);
        assert_eq!(events.try_recv()?.key, AUTH_TOKEN_KEY);
        assert_eq!(events.try_recv()?.key, GUEST_SESSION_KEY);
        assert_eq!(ours.get(AUTH_TOKEN_KEY).as_deref(), Some("t-2"));

        Ok(())
    }

    #[test]
    fn own_writes_are_not_announced() -> TestResult {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::open(dir.path().join("credentials.json"))?;

        storage.set(AUTH_TOKEN_KEY, "t-1")?;
        storage.remove(AUTH_TOKEN_KEY)?;

        assert!(storage.reload()?.is_empty());

        Ok(())
    }

    #[test]
    fn writes_keep_keys_from_other_writers() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");

        let ours = FileStorage::open(&path)?;
        let theirs = FileStorage::open(&path)?;
        let mut events = ours.subscribe();

        theirs.set(AUTH_TOKEN_KEY, "t-2")?;
        ours.set(GUEST_SESSION_KEY, "{}")?;

        let reopened = FileStorage::open(&path)?;

        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("t-2"));
        assert_eq!(reopened.get(GUEST_SESSION_KEY).as_deref(), Some("{}"));
        assert_eq!(ours.get(AUTH_TOKEN_KEY).as_deref(), Some("t-2"));
        assert_eq!(events.try_recv()?.key, AUTH_TOKEN_KEY);

        Ok(())
    }

    #[test]
    fn removal_keeps_keys_from_other_writers() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.json");

        let ours = FileStorage::open(&path)?;
        let theirs = FileStorage::open(&path)?;

        ours.set(GUEST_SESSION_KEY, "{}")?;
        theirs.set(AUTH_TOKEN_KEY, "t-2")?;
        ours.remove(GUEST_SESSION_KEY)?;

        let reopened = FileStorage::open(&path)?;

        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("t-2"));
        assert_eq!(reopened.get(GUEST_SESSION_KEY), None);

        Ok(())
    }

    #[test]
    fn failed_write_leaves_cache_untouched() -> TestResult {
        let dir = tempfile::tempdir()?;
        let blocked = dir.path().join("blocked");
        let storage = FileStorage::open(blocked.join("credentials.json"))?;

        fs::write(&blocked, b"not a directory")?;

        assert!(storage.set(AUTH_TOKEN_KEY, "t-1").is_err());
        assert_eq!(storage.get(AUTH_TOKEN_KEY), None);

        Ok(())
    }

    #[test]
    fn no_temporary_files_are_left_behind() -> TestResult {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::open(dir.path().join("credentials.json"))?;

        storage.set(AUTH_TOKEN_KEY, "t-1")?;
        storage.set(USER_KEY, "{}")?;

        let entries = std::fs::read_dir(dir.path())?.count();

        assert_eq!(entries, 1);

        Ok(())
    }

    #[test]
    fn changed_keys_covers_removals() {
        let before = HashMap::from([("a".to_string(), "1".to_string())]);
        let after = HashMap::new();

        assert_eq!(changed_keys(&before, &after), ["a"]);
    }
}
