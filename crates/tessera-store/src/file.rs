//! JSON file secure store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use fs2::FileExt;
use tracing::{debug, instrument};
use uuid::Uuid;

use tessera_core::SecureStore;
use tessera_core::error::StoreError;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

type Entries = BTreeMap<String, String>;

/// Secure store persisting entries in a single JSON file.
///
/// The file is created owner-only (`0600` on Unix) and replaced atomically
/// on every write. Writers serialize on an exclusive lock on a sibling
/// `.lock` file, so several processes may share one store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file and its parent directory are created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// A store in the per-user data directory, e.g.
    /// `~/.local/share/tessera/session.json` on Linux.
    pub fn default_location() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("", "", "tessera").ok_or_else(|| StoreError::Backend {
            message: "could not determine the user data directory".to_string(),
        })?;
        Ok(Self::new(dirs.data_dir().join("session.json")))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.file_name();
        name.push_str(".lock");
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        let name = format!(".{}.{}.tmp", self.file_name(), Uuid::new_v4().simple());
        self.path.with_file_name(name)
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session.json".to_string())
    }

    /// Read all entries; a missing file is an empty store.
    fn load(&self) -> Result<Entries, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply `edit` to the entries under the writer lock.
    fn update<F>(&self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Entries) -> bool,
    {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let result = self.load().and_then(|mut entries| {
            if !edit(&mut entries) {
                return Ok(());
            }
            if entries.is_empty() {
                self.delete_file()
            } else {
                self.write_atomic(&entries)
            }
        });

        lock_file.unlock()?;
        result
    }

    fn write_atomic(&self, entries: &Entries) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let temp = self.temp_path();

        let written = (|| -> Result<(), StoreError> {
            let mut file = open_private(&temp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)?;
            Ok(())
        })();

        if written.is_err() {
            let _ = fs::remove_file(&temp);
        }
        written
    }

    fn delete_file(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(FileStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("file store task failed: {}", e),
            })?
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[async_trait]
impl SecureStore for FileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.blocking(move |store| Ok(store.load()?.remove(&key)))
            .await
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |store| {
            store.update(|entries| {
                entries.insert(key, value);
                true
            })
        })
        .await?;
        debug!("Stored entry");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |store| store.update(|entries| entries.remove(&key).is_some()))
            .await?;
        debug!("Removed entry");
        Ok(())
    }
}
