//! Flat key/value persistence for the user config.
//!
//! Stores are last-writer-wins per top-level key. Concurrent loaders may
//! both migrate and both write; since migration is idempotent the writes
//! converge.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use {
    serde_json::{Map, Value},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    schema::json_kind,
};

pub trait ConfigStore: Send + Sync {
    /// Every stored key.
    fn read_all(&self) -> Result<Map<String, Value>>;

    /// Replaces each top-level key in `patch`, leaving the others alone.
    fn write_patch(&self, patch: Map<String, Value>) -> Result<()>;
}

// ── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contents(contents: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(contents)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConfigStore for MemoryStore {
    fn read_all(&self) -> Result<Map<String, Value>> {
        Ok(self.lock().clone())
    }

    fn write_patch(&self, patch: Map<String, Value>) -> Result<()> {
        self.lock().extend(patch);
        Ok(())
    }
}

// ── JSON file store ─────────────────────────────────────────────────────────

/// One JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<Mutex<JsonFileStoreInner>>,
}

#[derive(Debug)]
struct JsonFileStoreInner {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JsonFileStoreInner { path: path.into() })),
        }
    }

    /// Store at the per-user default location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_store_path()?))
    }

    fn lock(&self) -> MutexGuard<'_, JsonFileStoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Lenient read for callers that only look: anything unreadable is empty.
    fn load_from_path(path: &Path) -> Map<String, Value> {
        match Self::read_existing(path) {
            Ok(contents) => contents,
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "config store is unreadable and will be ignored"
                );
                Map::new()
            },
        }
    }

    /// Strict read before a write. Only a missing file counts as empty, so a
    /// store that exists but cannot be parsed is never overwritten.
    fn read_existing(path: &Path) -> Result<Map<String, Value>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(error.into()),
        };
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::message(format!(
                "config store at {} holds a JSON {} instead of an object",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn save_to_path(path: &Path, contents: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| Error::persist(parent, error))?;
        }
        let data = serde_json::to_string_pretty(contents)?;

        // Temp file + rename so readers never observe partially-written JSON.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("json.tmp.{nanos}"));
        std::fs::write(&temp_path, &data).map_err(|error| Error::persist(&temp_path, error))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600));
        }
        std::fs::rename(&temp_path, path).map_err(|error| {
            let _ = std::fs::remove_file(&temp_path);
            warn!(
                temp_path = %temp_path.display(),
                path = %path.display(),
                error = %error,
                "failed to atomically replace config store"
            );
            Error::persist(path, error)
        })?;
        debug!(path = %path.display(), keys = contents.len(), "saved config store");
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn read_all(&self) -> Result<Map<String, Value>> {
        let guard = self.lock();
        Ok(Self::load_from_path(&guard.path))
    }

    fn write_patch(&self, patch: Map<String, Value>) -> Result<()> {
        let guard = self.lock();
        let mut contents = Self::read_existing(&guard.path)?;
        contents.extend(patch);
        Self::save_to_path(&guard.path, &contents)
    }
}

/// `<config dir>/chatbox/config.json` for the current user.
pub fn default_store_path() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "chatbox")
        .map(|dirs| dirs.config_dir().join("config.json"))
        .ok_or_else(|| Error::message("no per-user config directory available"))
}
