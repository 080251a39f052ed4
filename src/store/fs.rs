//! Filesystem object store
//!
//! Each namespace is a directory under the backend root and each object is
//! a file named after its key. Writes go to a hidden temp file first and
//! are renamed into place, so a crash never leaves a half-written object.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{Backend, ObjectEntry, ObjectStore};
use crate::error::{VaultError, VaultResult};
use crate::file_io::write_atomic;

/// Backend rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Backend for FsBackend {
    fn open(&self, namespace: &str) -> VaultResult<Box<dyn ObjectStore>> {
        Ok(Box::new(FsObjectStore::open(self.root.clone(), namespace)?))
    }
}

/// A single namespace directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    namespace: String,
    dir: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) the namespace directory under `root`
    pub fn open(root: PathBuf, namespace: &str) -> VaultResult<Self> {
        if !is_plain_name(namespace) {
            return Err(VaultError::Config(format!("Invalid namespace name: '{}'", namespace)));
        }

        let dir = root.join(namespace);
        fs::create_dir_all(&dir)
            .map_err(|e| VaultError::storage("open", namespace, format!("{}: {}", dir.display(), e)))?;

        Ok(Self {
            namespace: namespace.to_string(),
            dir,
        })
    }

    fn object_path(&self, operation: &'static str, key: &str) -> VaultResult<PathBuf> {
        if !is_plain_name(key) || key.starts_with('.') {
            return Err(VaultError::storage(operation, key, "key is not a plain file name"));
        }
        Ok(self.dir.join(key))
    }
}

impl ObjectStore for FsObjectStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn put(&self, key: &str, bytes: &[u8]) -> VaultResult<()> {
        let path = self.object_path("put", key)?;
        write_atomic(&path, bytes).map_err(|e| VaultError::storage("put", key, e))
    }

    fn get(&self, key: &str) -> VaultResult<Vec<u8>> {
        let path = self.object_path("get", key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(VaultError::NotFound {
                namespace: self.namespace.clone(),
                key: key.to_string(),
            }),
            Err(e) => Err(VaultError::storage("get", key, e)),
        }
    }

    fn list(&self, prefix: &str) -> VaultResult<Vec<ObjectEntry>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| VaultError::storage("list", prefix, e))?;

        let mut objects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::storage("list", prefix, e))?;
            let key = entry.file_name().to_string_lossy().to_string();

            // Skip in-flight temp files
            if key.starts_with('.') || !key.starts_with(prefix) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| VaultError::storage("list", &key, e))?;
            if metadata.is_file() {
                objects.push(ObjectEntry {
                    key,
                    size_bytes: metadata.len(),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        let path = self.object_path("delete", key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::storage("delete", key, e)),
        }
    }

    fn exists(&self, key: &str) -> VaultResult<bool> {
        let path = self.object_path("exists", key)?;
        match fs::metadata(&path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VaultError::storage("exists", key, e)),
        }
    }
}

/// A single path component with no separators or parent references
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
