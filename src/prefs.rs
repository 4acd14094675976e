use crate::model::{Filter, PageVariant};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lock poisoned")]
    Poisoned,

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Key-value persistence port for operator preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

/// JSON file holding every entry; rewritten on each change.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(
            "Loaded {} preference entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value);
        self.flush(&guard)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if guard.remove(key).is_some() {
            self.flush(&guard)?;
        }
        Ok(())
    }
}

/// Typed view of the store for one page variant.
pub struct Preferences<'a> {
    store: &'a dyn PreferenceStore,
    variant: PageVariant,
}

impl<'a> Preferences<'a> {
    pub fn new(store: &'a dyn PreferenceStore, variant: PageVariant) -> Self {
        Self { store, variant }
    }

    pub fn filter_key(&self) -> String {
        format!("TC_{}_FILTER", self.variant.slug().to_uppercase())
    }

    pub fn strategy_key(&self) -> String {
        format!("TC_{}_STRATEGY", self.variant.slug().to_uppercase())
    }

    pub fn load_filter(&self) -> Option<Filter> {
        self.load(&self.filter_key())
    }

    pub fn load_strategy<T: DeserializeOwned>(&self) -> Option<T> {
        self.load(&self.strategy_key())
    }

    pub fn save<S: Serialize>(&self, filter: &Filter, strategy: &S) -> Result<(), StoreError> {
        self.store
            .set(&self.filter_key(), serde_json::to_string(filter)?)?;
        self.store
            .set(&self.strategy_key(), serde_json::to_string(strategy)?)?;
        tracing::debug!("Saved {} preferences", self.variant.slug());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(&self.filter_key())?;
        self.store.clear(&self.strategy_key())
    }

    // Unreadable entries fall back to page defaults instead of failing the page.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!("Unable to read preference {key}: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring unreadable preference {key}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, IdentifyKey, Protocol, Strategy, StrategyKind, StrategyPair};

    fn sample_filter() -> Filter {
        Filter {
            iface: Some("eth0".into()),
            protocol: Some(Protocol::Ip),
            direction: Some(Direction::Outgoing),
            identify_key: Some(IdentifyKey::ServerPort),
            identify_value: Some("1935".into()),
        }
    }

    #[test]
    fn keys_are_scoped_by_variant() {
        let store = MemoryStore::new();
        let simple = Preferences::new(&store, PageVariant::Simple);
        let combined = Preferences::new(&store, PageVariant::Combined);
        assert_eq!(simple.filter_key(), "TC_SIMPLE_FILTER");
        assert_eq!(combined.strategy_key(), "TC_COMBINED_STRATEGY");

        let strategy = Strategy::page_default(Some(StrategyKind::Rate));
        simple.save(&sample_filter(), &strategy).unwrap();
        assert_eq!(simple.load_filter(), Some(sample_filter()));
        assert_eq!(simple.load_strategy::<Strategy>(), Some(strategy));
        assert_eq!(combined.load_filter(), None);
    }

    #[test]
    fn clear_removes_both_entries() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store, PageVariant::Combined);
        prefs
            .save(&sample_filter(), &StrategyPair::page_default())
            .unwrap();
        prefs.clear().unwrap();
        assert_eq!(prefs.load_filter(), None);
        assert_eq!(prefs.load_strategy::<StrategyPair>(), None);
    }

    #[test]
    fn corrupt_entry_reads_as_missing() {
        let store = MemoryStore::new();
        store.set("TC_SIMPLE_FILTER", "{not json".into()).unwrap();
        let prefs = Preferences::new(&store, PageVariant::Simple);
        assert_eq!(prefs.load_filter(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "tc-console-prefs-{}-{:?}.json",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        Preferences::new(&store, PageVariant::Simple)
            .save(&sample_filter(), &Strategy::page_default(Some(StrategyKind::Loss)))
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        let prefs = Preferences::new(&reopened, PageVariant::Simple);
        assert_eq!(prefs.load_filter(), Some(sample_filter()));
        prefs.clear().unwrap();
        assert_eq!(reopened.get("TC_SIMPLE_FILTER").unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
