//! Persisted key-value preferences (selected model, rules template).
//!
//! The store is injected rather than reached for globally so it can be swapped
//! for an in-memory fake under test. Writes notify subscribers through a
//! broadcast channel; the prompt tester listens on it so rules edits made on
//! the Rules tab propagate without polling.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

/// Persisted model id chosen in the picker.
pub const SELECTED_MODEL: &str = "selected-model";
/// Rules template text prepended to every prompt.
pub const RULES_TEMPLATE: &str = "rules-template";
/// ISO-8601 timestamp of the last rules save.
pub const RULES_SAVED_AT: &str = "rules-template-saved-at";

const PREF_EVENT_CAP: usize = 64;

#[derive(Debug, Clone)]
pub struct PrefChange {
    pub key: String,
}

#[derive(Debug, Error)]
pub enum PrefError {
    #[error("failed to read or write preference file: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("failed to replace preference file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// String-keyed preference storage with change notification.
///
/// Reads are synchronous and read-after-write consistent within the process.
pub trait PrefStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PrefError>;
    fn remove(&self, key: &str) -> Result<(), PrefError>;
    fn subscribe(&self) -> broadcast::Receiver<PrefChange>;
}

/// Disk-backed store, one JSON object per file.
pub struct FilePrefs {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<PrefChange>,
}

impl FilePrefs {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn load(path: PathBuf) -> Result<Self, PrefError> {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            events: broadcast::channel(PREF_EVENT_CAP).0,
        })
    }

    /// Write-then-rename so a crash mid-save never truncates the file.
    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), PrefError> {
        let json = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dir = self
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        use std::io::Write as _;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    fn notify(&self, key: &str) {
        // Ignore receiver count; nobody listening is fine.
        let _ = self.events.send(PrefChange {
            key: key.to_string(),
        });
    }
}

impl PrefStore for FilePrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefError> {
        {
            let mut entries = self.entries.write();
            let previous = entries.insert(key.to_string(), value.to_string());
            if let Err(e) = self.persist(&entries) {
                // Roll back so memory keeps matching what a reload would see.
                match previous {
                    Some(prev) => {
                        entries.insert(key.to_string(), prev);
                    }
                    None => {
                        entries.remove(key);
                    }
                }
                return Err(e);
            }
        }
        self.notify(key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PrefError> {
        {
            let mut entries = self.entries.write();
            let Some(previous) = entries.remove(key) else {
                return Ok(());
            };
            if let Err(e) = self.persist(&entries) {
                entries.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        self.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PrefChange> {
        self.events.subscribe()
    }
}

/// In-memory store for tests and headless use.
pub struct MemoryPrefs {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<PrefChange>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            events: broadcast::channel(PREF_EVENT_CAP).0,
        }
    }
}

impl Default for MemoryPrefs {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        let _ = self.events.send(PrefChange {
            key: key.to_string(),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PrefError> {
        if self.entries.write().remove(key).is_some() {
            let _ = self.events.send(PrefChange {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PrefChange> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_read_after_write() {
        let store = MemoryPrefs::new();
        assert_eq!(store.get(SELECTED_MODEL), None);

        store.set(SELECTED_MODEL, "gpt-x").unwrap();
        assert_eq!(store.get(SELECTED_MODEL), Some("gpt-x".to_string()));

        store.remove(SELECTED_MODEL).unwrap();
        assert_eq!(store.get(SELECTED_MODEL), None);
    }

    #[tokio::test]
    async fn writes_notify_subscribers() {
        let store = MemoryPrefs::new();
        let mut rx = store.subscribe();

        store.set(RULES_TEMPLATE, "Be concise.").unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, RULES_TEMPLATE);

        store.remove(RULES_TEMPLATE).unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, RULES_TEMPLATE);
    }

    #[test]
    fn removing_absent_key_does_not_notify() {
        let store = MemoryPrefs::new();
        let mut rx = store.subscribe();
        store.remove("never-set").unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = FilePrefs::load(path.clone()).unwrap();
        store.set(RULES_TEMPLATE, "Always answer in French.").unwrap();
        store.set(SELECTED_MODEL, "m1").unwrap();
        store.remove(SELECTED_MODEL).unwrap();

        // Fresh handle sees what the first one persisted.
        let reopened = FilePrefs::load(path).unwrap();
        assert_eq!(
            reopened.get(RULES_TEMPLATE),
            Some("Always answer in French.".to_string())
        );
        assert_eq!(reopened.get(SELECTED_MODEL), None);
    }

    #[test]
    fn failed_persist_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the store expects its parent directory, so
        // every persist attempt fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let mut seeded = HashMap::new();
        seeded.insert(RULES_TEMPLATE.to_string(), "Be concise.".to_string());
        let store = FilePrefs {
            path: blocker.join("prefs.json"),
            entries: RwLock::new(seeded),
            events: broadcast::channel(PREF_EVENT_CAP).0,
        };
        let mut rx = store.subscribe();

        assert!(store.set(SELECTED_MODEL, "m1").is_err());
        assert_eq!(store.get(SELECTED_MODEL), None);

        assert!(store.set(RULES_TEMPLATE, "Be verbose.").is_err());
        assert_eq!(store.get(RULES_TEMPLATE), Some("Be concise.".to_string()));

        assert!(store.remove(RULES_TEMPLATE).is_err());
        assert_eq!(store.get(RULES_TEMPLATE), Some("Be concise.".to_string()));

        // No change notifications for writes that never landed.
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn file_store_starts_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePrefs::load(dir.path().join("missing.json")).unwrap();
        assert_eq!(store.get(RULES_TEMPLATE), None);
    }
}
