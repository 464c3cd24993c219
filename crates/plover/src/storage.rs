use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

/// A destination for generated files.
///
/// Paths are relative to the root of the generated site and use `/` as a
/// separator.
pub trait Store {
    type Error: std::error::Error;

    /// Removes everything previously stored.
    fn clear(&self) -> Result<(), Self::Error>;

    fn store(&self, path: &str, contents: &[u8]) -> Result<(), Self::Error>;
}

pub struct DiskStorage {
    output_path: PathBuf,
}

impl DiskStorage {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl Store for DiskStorage {
    type Error = io::Error;

    fn clear(&self) -> Result<(), Self::Error> {
        match fs::remove_dir_all(&self.output_path) {
            Ok(()) => {
                debug!(path = %self.output_path.display(), "cleared output directory");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Writes the file next to its destination and then renames it into place,
    /// so a reader never sees a partially written file.
    fn store(&self, path: &str, contents: &[u8]) -> Result<(), Self::Error> {
        let output_path = self.output_path.join(path.trim_start_matches('/'));

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_path = output_path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        fs::write(&temp_path, contents)?;
        if let Err(err) = fs::rename(&temp_path, &output_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        debug!(path = %output_path.display(), bytes = contents.len(), "wrote file");

        Ok(())
    }
}

/// Keeps generated files in memory, keyed by path.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    storage: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    /// Returns the stored file at `path` as text.
    pub fn get(&self, path: &str) -> Option<String> {
        let storage = self.storage.read().ok()?;
        let contents = storage.get(path)?;

        Some(String::from_utf8_lossy(contents).into_owned())
    }

    /// Returns the paths of all stored files, sorted.
    pub fn paths(&self) -> Vec<String> {
        let Ok(storage) = self.storage.read() else {
            return Vec::new();
        };

        let mut paths = storage.keys().cloned().collect::<Vec<_>>();
        paths.sort();
        paths
    }
}

#[derive(Error, Debug)]
pub enum InMemoryStorageError {
    #[error("poisoned")]
    Poisoned,
}

impl Store for InMemoryStorage {
    type Error = InMemoryStorageError;

    fn clear(&self) -> Result<(), Self::Error> {
        self.storage
            .write()
            .map_err(|_| InMemoryStorageError::Poisoned)?
            .clear();

        Ok(())
    }

    fn store(&self, path: &str, contents: &[u8]) -> Result<(), Self::Error> {
        self.storage
            .write()
            .map_err(|_| InMemoryStorageError::Poisoned)?
            .insert(path.trim_start_matches('/').to_string(), contents.to_vec());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_disk_storage_writes_and_clears() {
        let output_path =
            std::env::temp_dir().join(format!("plover-storage-test-{}", std::process::id()));
        let storage = DiskStorage::new(output_path.clone());

        storage.clear().unwrap();
        storage.store("labels/rust-1.html", b"<p>rust</p>").unwrap();
        storage.store("/index.html", b"<p>home</p>").unwrap();

        assert_eq!(
            fs::read_to_string(output_path.join("labels/rust-1.html")).unwrap(),
            "<p>rust</p>"
        );
        assert_eq!(
            fs::read_to_string(output_path.join("index.html")).unwrap(),
            "<p>home</p>"
        );
        assert!(!output_path.join("index.html.tmp").exists());

        storage.clear().unwrap();
        assert!(!output_path.exists());

        // Clearing a missing directory is fine.
        storage.clear().unwrap();
    }

    #[test]
    fn test_in_memory_storage() {
        let storage = InMemoryStorage::default();

        storage.store("/index.html", b"home").unwrap();
        storage.store("posts/a-1.html", b"a").unwrap();

        assert_eq!(storage.paths(), vec!["index.html", "posts/a-1.html"]);
        assert_eq!(storage.get("index.html").as_deref(), Some("home"));

        storage.clear().unwrap();
        assert_eq!(storage.paths(), Vec::<String>::new());
    }
}
