//! Local key-value persistence for the timer record

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    state::{TimerState, TimerStatePatch},
};

/// Fixed key the timer record lives under
pub const TIMER_STATE_KEY: &str = "practiceTimerState";

/// Generic string key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Key-value store backed by a single JSON object file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StoreError::Io(err)),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Readers only ever see a complete file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed access to the single persisted [`TimerState`] record
pub struct TimerStore {
    backend: Box<dyn KeyValueStore>,
}

impl TimerStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Last saved record, or `None` when nothing usable is stored
    pub fn load(&self) -> Result<Option<TimerState>, StoreError> {
        let Some(raw) = self.backend.get(TIMER_STATE_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring unreadable timer state: {}", e);
                Ok(None)
            }
        }
    }

    /// Merge `patch` onto the last saved record and write the result
    pub fn save(&self, patch: TimerStatePatch) -> Result<TimerState, StoreError> {
        let mut state = self.load()?.unwrap_or_default();
        state.merge(patch);
        self.backend
            .set(TIMER_STATE_KEY, &serde_json::to_string(&state)?)?;
        debug!(
            "Persisted timer state: elapsed={}s running={}",
            state.elapsed_seconds, state.is_running
        );
        Ok(state)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(TIMER_STATE_KEY)?;
        debug!("Cleared persisted timer state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("{nanos}_{name}"))
    }

    fn sample() -> TimerState {
        TimerState {
            elapsed_seconds: 65,
            start_time: None,
            is_running: false,
            focus: "Scales".to_string(),
            base_elapsed_seconds: 65,
            session_start_time: Some(1_760_000_000_000),
        }
    }

    #[test]
    fn load_returns_none_when_empty() {
        let store = TimerStore::new(MemoryStore::new());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = TimerStore::new(MemoryStore::new());
        store.save(sample().into()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn partial_save_merges_onto_previous_record() {
        let store = TimerStore::new(MemoryStore::new());
        store.save(sample().into()).unwrap();
        store.save(TimerStatePatch::elapsed(70)).unwrap();

        let loaded = store.load().unwrap().expect("record should exist");
        assert_eq!(loaded.elapsed_seconds, 70);
        assert_eq!(loaded.focus, "Scales");
        assert_eq!(loaded.session_start_time, sample().session_start_time);
    }

    #[test]
    fn clear_removes_record() {
        let store = TimerStore::new(MemoryStore::new());
        store.save(sample().into()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn garbage_record_is_treated_as_missing() {
        let backend = MemoryStore::new();
        backend.set(TIMER_STATE_KEY, "not json").unwrap();
        let store = TimerStore::new(backend);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_file("practice_timer_store.json");

        let store = TimerStore::new(FileStore::new(&path));
        store.save(sample().into()).unwrap();

        let reopened = TimerStore::new(FileStore::new(&path));
        assert_eq!(reopened.load().unwrap(), Some(sample()));

        reopened.clear().unwrap();
        assert_eq!(TimerStore::new(FileStore::new(&path)).load().unwrap(), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let path = temp_file("practice_timer_keys.json");
        let store = FileStore::new(&path);
        store.set("authToken", "abc").unwrap();
        store.set(TIMER_STATE_KEY, "{}").unwrap();
        store.remove(TIMER_STATE_KEY).unwrap();

        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get(TIMER_STATE_KEY).unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
