//! Key-value persistence for quota state
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::quota::types::QuotaState;

/// Storage backend holding one serialized `QuotaState` under a fixed key
pub trait QuotaStore: Send + Sync {
    /// Read the stored state, `None` if nothing was stored yet
    fn load(&self) -> Result<Option<QuotaState>>;

    /// Overwrite the stored state
    fn save(&self, state: &QuotaState) -> Result<()>;

    /// Remove the stored state entirely
    fn clear(&self) -> Result<()>;
}

/// JSON file store: `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileQuotaStore {
    path: PathBuf,
}

impl FileQuotaStore {
    /// Create a store for `key` inside `dir`
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QuotaStore for FileQuotaStore {
    fn load(&self) -> Result<Option<QuotaState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .context("Failed to read quota file")?;

        let state: QuotaState = serde_json::from_str(&json)
            .context("Failed to deserialize quota state")?;

        Ok(Some(state))
    }

    fn save(&self, state: &QuotaState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create quota storage directory")?;
        }

        let json = serde_json::to_string_pretty(state)
            .context("Failed to serialize quota state")?;

        fs::write(&self.path, json)
            .context("Failed to write quota file")?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .context("Failed to delete quota file")?;
        }
        Ok(())
    }
}

/// In-process store; keeps the serialized form like a browser key-value slot
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    slot: Mutex<Option<String>>,
    failing: AtomicBool,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a state
    pub fn with_state(state: &QuotaState) -> Result<Self> {
        let store = Self::new();
        store.save(state)?;
        Ok(store)
    }

    /// Make every subsequent operation fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw stored value
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("quota storage unavailable");
        }
        Ok(())
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn load(&self) -> Result<Option<QuotaState>> {
        self.check_available()?;
        match self.raw() {
            Some(json) => {
                let state = serde_json::from_str(&json)
                    .context("Failed to deserialize quota state")?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    fn save(&self, state: &QuotaState) -> Result<()> {
        self.check_available()?;
        let json = serde_json::to_string(state)
            .context("Failed to serialize quota state")?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.check_available()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_state() -> QuotaState {
        let mut state = QuotaState::new(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(), 1500);
        state.calls_today = 12;
        state
    }

    #[test]
    fn test_file_store_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = FileQuotaStore::new(temp.path(), "quota");

        assert!(store.load().unwrap().is_none());
        store.save(&sample_state()).unwrap();
        assert!(store.path().ends_with("quota.json"));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample_state());
    }

    #[test]
    fn test_file_store_clear() {
        let temp = TempDir::new().unwrap();
        let store = FileQuotaStore::new(temp.path().join("nested"), "quota");

        store.save(&sample_state()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_is_error() {
        let temp = TempDir::new().unwrap();
        let store = FileQuotaStore::new(temp.path(), "quota");
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_memory_store_failing() {
        let store = MemoryQuotaStore::with_state(&sample_state()).unwrap();
        store.set_failing(true);
        assert!(store.load().is_err());
        assert!(store.save(&sample_state()).is_err());
        store.set_failing(false);
        assert_eq!(store.load().unwrap(), Some(sample_state()));
    }
}
