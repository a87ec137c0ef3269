// Persistent session storage backends.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use elka_core::{CoreError, KeyValueStore};

const KEYRING_SERVICE: &str = "elka";

fn storage_err(message: impl Into<String>) -> CoreError {
    CoreError::Storage {
        message: message.into(),
    }
}

// ── File ─────────────────────────────────────────────────────────────

/// A JSON object on disk, rewritten on every change.
///
/// The file is read once at open; this process is assumed to be the only
/// writer while it runs.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A corrupt file is
    /// treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring corrupt session file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy, write the copy, and only then keep it. A failed
    /// write leaves memory matching the file.
    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| storage_err("session file lock poisoned"))?;
        let mut next = entries.clone();
        f(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    /// Write through a temp file in the same directory, then rename over
    /// the target. The temp file is created owner-only (0600 on Unix).
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| storage_err(format!("{}: {e}", dir.display())))?;

        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| storage_err(format!("failed to encode session: {e}")))?;
        let io_err = |e: std::io::Error| storage_err(format!("{}: {e}", self.path.display()));

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(raw.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!("session written to {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| storage_err("session file lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

// ── Keyring ──────────────────────────────────────────────────────────

/// One keyring entry per key, named `{profile}/{key}` under the `elka`
/// service.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    profile: String,
}

impl KeyringStore {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_owned(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/{key}", self.profile))
            .map_err(|e| storage_err(format!("keyring: {e}")))
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(storage_err(format!("keyring: {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| storage_err(format!("keyring: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(storage_err(format!("keyring: {e}"))),
        }
    }
}
