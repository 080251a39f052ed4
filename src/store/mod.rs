//! Object storage capability
//!
//! An `ObjectStore` is bound to a single namespace (a bucket, a prefix in a
//! shared bucket, or a directory) and exposes put/get/list/delete/exists.
//! It carries no business logic and never retries: every failure comes
//! back as `VaultError::Storage` with the underlying cause.
//!
//! A `Backend` opens stores by namespace name. Three backends exist:
//!
//! - `FsBackend`: one directory per namespace under a root
//! - `S3Backend`: any S3-compatible service
//! - `MemoryBackend`: in-process, for tests

mod fs;
mod memory;
mod s3;

pub use fs::{FsBackend, FsObjectStore};
pub use memory::{MemoryBackend, MemoryObjectStore};
pub use s3::{bucket_for_namespace, S3Backend, S3ObjectStore};

use crate::config::paths::VaultPaths;
use crate::config::settings::StorageSettings;
use crate::error::VaultResult;

/// A listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size_bytes: u64,
}

/// Storage operations against one namespace
pub trait ObjectStore {
    /// Namespace this store is bound to
    fn namespace(&self) -> &str;

    /// Store `bytes` under `key`, replacing any existing object
    fn put(&self, key: &str, bytes: &[u8]) -> VaultResult<()>;

    /// Fetch an object; a missing key is `VaultError::NotFound`
    fn get(&self, key: &str) -> VaultResult<Vec<u8>>;

    /// List objects whose key starts with `prefix`, ordered by key
    fn list(&self, prefix: &str) -> VaultResult<Vec<ObjectEntry>>;

    /// Remove an object
    fn delete(&self, key: &str) -> VaultResult<()>;

    /// Check whether an object exists
    fn exists(&self, key: &str) -> VaultResult<bool>;
}

/// Opens object stores by namespace
pub trait Backend {
    fn open(&self, namespace: &str) -> VaultResult<Box<dyn ObjectStore>>;
}

/// Build the backend described by the storage settings
pub fn open_backend(settings: &StorageSettings, paths: &VaultPaths) -> VaultResult<Box<dyn Backend>> {
    match settings {
        StorageSettings::Filesystem { root } => {
            let root = root.clone().unwrap_or_else(|| paths.store_dir());
            Ok(Box::new(FsBackend::new(root)))
        }
        StorageSettings::S3(s3) => Ok(Box::new(S3Backend::connect(s3)?)),
    }
}
