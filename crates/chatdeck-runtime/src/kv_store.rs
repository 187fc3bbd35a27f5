//! String-keyed persistent storage.
//!
//! [`KeyValueStore`] is the seam between the transcript store and wherever
//! values actually live. Values are JSON text; [`load_json`] and
//! [`save_json`] do the encoding at the call site.
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: storage failures never panic; operations
//!    return `Result`.
//! 2. **Atomic writes**: [`FileStore`] writes a temp file and renames it.
//! 3. **Malformed values read as absent**: [`load_json`] logs and returns
//!    `None` for values that do not parse.
//! 4. **Last write wins**: there is no transaction across keys.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returns error, cache unaffected |
//! | `StorageError::Serialization` | JSON encode failure | Returns error |
//! | `StorageError::Corruption` | Lock poisoned | Returns error |
//! | Unparseable store file | Truncated or hand-edited file | Moved to `*.json.corrupt`, store starts empty |
//! | Malformed value | Hand-edited or foreign data | `load_json` yields `None` |

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Value could not be encoded.
    Serialization(String),
    /// A lock was poisoned.
    Corruption(String),
    /// Backend cannot be used.
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_)
            | StorageError::Corruption(_)
            | StorageError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Synchronous string-keyed store of JSON text values.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Raw value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value for `key`.
    fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// All keys, sorted.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Read and decode a JSON value. Missing, unreadable, and malformed values
/// all come back as `None`; the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(store = store.name(), key, error = %e, "storage read failed");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(store = store.name(), key, error = %e, "malformed stored value, treating as empty");
            None
        }
    }
}

/// Encode and store a JSON value.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("failed to encode {key}: {e}")))?;
    store.set(key, raw)
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw values.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

fn poisoned() -> StorageError {
    StorageError::Corruption("lock poisoned".into())
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.data.read().map_err(|_| poisoned())?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(|_| poisoned())?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(|_| poisoned())?;
        guard.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let guard = self.data.read().map_err(|_| poisoned())?;
        Ok(guard.keys().cloned().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk layout of a [`FileStore`].
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    format_version: u32,
    entries: BTreeMap<String, String>,
}

impl StoreFile {
    const FORMAT_VERSION: u32 = 1;
}

/// JSON file store with atomic write-rename.
///
/// The whole file is read once and cached; every write rewrites it.
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    /// Store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(None),
        }
    }

    /// Store at `$XDG_STATE_HOME/chatdeck/{app_name}/store.json`, falling
    /// back to `~/.local/state`, then the working directory.
    #[must_use]
    pub fn default_for_app(app_name: &str) -> Self {
        let path = state_dir().join("chatdeck").join(app_name).join("store.json");
        Self::new(path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        tmp
    }

    fn read_file(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let file: StoreFile = match serde_json::from_reader(reader) {
            Ok(file) => file,
            Err(e) => {
                self.quarantine(&e);
                return Ok(BTreeMap::new());
            }
        };
        if file.format_version != StoreFile::FORMAT_VERSION {
            tracing::warn!(
                stored = file.format_version,
                expected = StoreFile::FORMAT_VERSION,
                "store file format version mismatch, ignoring stored values"
            );
            return Ok(BTreeMap::new());
        }
        Ok(file.entries)
    }

    /// Path an unparseable store file is moved to.
    #[must_use]
    pub fn corrupt_path(&self) -> PathBuf {
        let mut aside = self.path.clone();
        aside.set_extension("json.corrupt");
        aside
    }

    /// Move an unparseable store file aside so the next write starts fresh.
    fn quarantine(&self, error: &serde_json::Error) {
        let aside = self.corrupt_path();
        match fs::rename(&self.path, &aside) {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                moved_to = %aside.display(),
                %error,
                "store file unparseable, starting empty"
            ),
            Err(rename_err) => tracing::warn!(
                path = %self.path.display(),
                %error,
                %rename_err,
                "store file unparseable and could not be moved aside, starting empty"
            ),
        }
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = StoreFile {
            format_version: StoreFile::FORMAT_VERSION,
            entries: entries.clone(),
        };
        let tmp_path = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                StorageError::Serialization(format!("failed to serialize store: {e}"))
            })?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        tracing::trace!(path = %self.path.display(), entries = entries.len(), "store written");
        Ok(())
    }

    /// Run `f` over the loaded entries, loading from disk on first use.
    fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut guard = self.cache.write().map_err(|_| poisoned())?;
        if guard.is_none() {
            *guard = Some(self.read_file()?);
        }
        match guard.as_mut() {
            Some(entries) => f(entries),
            None => Err(StorageError::Unavailable("store cache not loaded".into())),
        }
    }

    /// Apply a mutation and persist it. The cache only changes if the write
    /// succeeds.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> StorageResult<()> {
        self.with_entries(|entries| {
            let mut next = entries.clone();
            f(&mut next);
            self.write_file(&next)?;
            *entries = next;
            Ok(())
        })
    }
}

/// State directory, falling back to the current directory.
fn state_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("state");
    }
    PathBuf::from(".")
}

impl KeyValueStore for FileStore {
    fn name(&self) -> &str {
        "FileStore"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_entries(|entries| Ok(entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.with_entries(|entries| Ok(entries.keys().cloned().collect()))
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1".into()).unwrap();
        store.set("b", "2".into()).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn json_helpers_encode_values() {
        let store = MemoryStore::new();
        save_json(&store, "ids", &vec!["x", "y"]).unwrap();
        assert_eq!(store.get("ids").unwrap().as_deref(), Some(r#"["x","y"]"#));
        let ids: Option<Vec<String>> = load_json(&store, "ids");
        assert_eq!(ids, Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn malformed_value_reads_as_none() {
        let store = MemoryStore::with_entries([("broken", "{not json")]);
        let value: Option<Vec<String>> = load_json(&store, "broken");
        assert_eq!(value, None);
        let missing: Option<String> = load_json(&store, "missing");
        assert_eq!(missing, None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = FileStore::new(&path);
            store.set("theme", r#""dark""#.into()).unwrap();
            store.set("gone", "1".into()).unwrap();
            store.remove("gone").unwrap();
        }
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some(r#""dark""#));
        assert_eq!(reopened.keys().unwrap(), vec!["theme".to_string()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.json");
        let store = FileStore::new(&path);
        store.set("k", "1".into()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_store_corrupt_file_is_set_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(fs::read_to_string(store.corrupt_path()).unwrap(), "not json");

        store.set("k", "1".into()).unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn file_store_ignores_other_format_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"format_version":99,"entries":{"k":"1"}}"#).unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn error_display() {
        let err = StorageError::Corruption("bad".into());
        assert_eq!(err.to_string(), "storage corruption: bad");
        let io: StorageError = std::io::Error::other("disk").into();
        assert!(std::error::Error::source(&io).is_some());
    }
}
