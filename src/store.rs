//! JSON file-backed [`PersistenceStore`].
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary file
//! that is renamed over the old one, so an interrupted write leaves the
//! previous value intact.

use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::host::{PersistenceStore, StoreError};

pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the default state directory
    pub fn default_dir() -> PathBuf {
        if let Some(mut path) = dirs::data_local_dir() {
            path.push("mdview");
            return path;
        }

        // Fallback to home directory
        if let Some(mut path) = dirs::home_dir() {
            path.push(".mdview");
            return path;
        }

        PathBuf::from(".mdview")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl PersistenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(?e, path = %path.display(), "Failed to read state file");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        tracing::trace!(path = %path.display(), "Writing state file");
        fs::create_dir_all(&self.dir).map_err(Self::io_error(&self.dir))?;
        fs::write(&tmp, value).map_err(Self::io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(Self::io_error(&path))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&path)(e)),
        }
    }
}
