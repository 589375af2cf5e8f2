//! Per-profile client identifier kept in local storage.

use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fs;
use std::hash::{BuildHasher, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use crate::messages::now_millis;

/// Storage key the identifier is kept under.
pub const CLIENT_ID_KEY: &str = "chat_client_id";

/// Minimal string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON object file, rewritten whole on every change.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open (creating the parent directory) the store at `path`.
    ///
    /// Returns `None` when the location is unusable, leaving the caller to
    /// decide whether a storage-less session is acceptable.
    pub fn open(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Local storage unavailable at {:?}: {}", parent, e);
                return None;
            }
        }
        Some(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| anyhow!("Corrupt storage file {:?}: {}", self.path, e))
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Return the stored identifier, generating and persisting one if absent.
///
/// Never fails: a missing or broken store yields a fresh identifier that
/// lives only as long as this session.
pub fn resolve_client_id(store: Option<&dyn KeyValueStore>) -> String {
    let Some(store) = store else {
        debug!("No local storage, using a session-only client id");
        return generate_client_id();
    };

    match store.get(CLIENT_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => return id,
        Ok(_) => {}
        Err(e) => warn!("Could not read client id: {}", e),
    }

    let id = generate_client_id();
    if let Err(e) = store.set(CLIENT_ID_KEY, &id) {
        warn!("Could not persist client id, it will not survive this session: {}", e);
    }
    id
}

/// Forget the stored identifier so the next resolve generates a new one.
pub fn reset_client_id(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(CLIENT_ID_KEY)
}

/// Random UUID v4 from the OS random source, or a timestamp plus a
/// hash-seeded suffix when that source is unavailable.
pub fn generate_client_id() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(e) => {
            warn!("System random source unavailable ({}), using fallback id", e);
            fallback_client_id(now_millis())
        }
    }
}

fn fallback_client_id(timestamp: i64) -> String {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_i64(timestamp);
    hasher.write_u32(std::process::id());
    format!("{:x}-{:012x}", timestamp, hasher.finish() & 0xffff_ffff_ffff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_is_stable_for_same_store() {
        let store = MemoryStore::new();
        let first = resolve_client_id(Some(&store));
        let second = resolve_client_id(Some(&store));
        assert_eq!(first, second);
        assert_eq!(store.get(CLIENT_ID_KEY).unwrap(), Some(first));
    }

    #[test]
    fn test_existing_id_is_never_regenerated() {
        let store = MemoryStore::new();
        store.set(CLIENT_ID_KEY, "existing-id").unwrap();
        assert_eq!(resolve_client_id(Some(&store)), "existing-id");
    }

    #[test]
    fn test_blank_stored_id_is_replaced() {
        let store = MemoryStore::new();
        store.set(CLIENT_ID_KEY, "  ").unwrap();
        let id = resolve_client_id(Some(&store));
        assert!(!id.trim().is_empty());
        assert_eq!(store.get(CLIENT_ID_KEY).unwrap(), Some(id));
    }

    #[test]
    fn test_no_store_still_yields_an_id() {
        let a = resolve_client_id(None);
        let b = resolve_client_id(None);
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_id_is_uuid_v4() {
        let id = generate_client_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_fallback_id_starts_with_timestamp() {
        let id = fallback_client_id(0x1234);
        assert!(id.starts_with("1234-"));
        assert_eq!(id.len(), "1234-".len() + 12);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chatline").join("storage.json");

        let first = {
            let store = FileStore::open(&path).unwrap();
            resolve_client_id(Some(&store))
        };
        let store = FileStore::open(&path).unwrap();
        assert_eq!(resolve_client_id(Some(&store)), first);
    }

    #[test]
    fn test_reset_forces_new_id() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        let first = resolve_client_id(Some(&store));
        reset_client_id(&store).unwrap();
        assert_eq!(store.get(CLIENT_ID_KEY).unwrap(), None);
        assert_ne!(resolve_client_id(Some(&store)), first);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        store.set("theme", "dark").unwrap();
        resolve_client_id(Some(&store));
        assert_eq!(store.get("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn test_corrupt_file_degrades_to_fresh_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        let store = FileStore::open(&path).unwrap();
        // Read fails, write fails too (it reads first), but an id is still returned
        assert!(!resolve_client_id(Some(&store)).is_empty());
    }
}
