//! Retrieval of stored artifacts
//!
//! Resolves an explicit identifier or "latest" and downloads the artifact
//! to a local path. A missing explicit identifier is an expected outcome,
//! reported as `RetrievalOutcome::NotFound` rather than an error.

use std::path::{Path, PathBuf};

use tracing::info;

use super::catalog::list_artifacts;
use crate::error::{VaultError, VaultResult};
use crate::file_io::write_atomic;
use crate::models::{ArtifactId, BackupArtifact, BackupClass};
use crate::store::ObjectStore;

/// Result of a retrieval request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// The artifact was downloaded to `destination`
    Retrieved {
        artifact: BackupArtifact,
        destination: PathBuf,
    },
    /// The requested identifier is not in the namespace; nothing was written
    NotFound { namespace: String, key: String },
}

impl RetrievalOutcome {
    /// Turn a `NotFound` outcome into an error, for callers that must fail on it
    pub fn into_result(self) -> VaultResult<(BackupArtifact, PathBuf)> {
        match self {
            Self::Retrieved {
                artifact,
                destination,
            } => Ok((artifact, destination)),
            Self::NotFound { namespace, key } => Err(VaultError::NotFound { namespace, key }),
        }
    }
}

/// Finds and downloads artifacts from one namespace
pub struct RetrievalManager<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> RetrievalManager<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// All artifacts of a class, newest first
    pub fn list(&self, class: BackupClass) -> VaultResult<Vec<BackupArtifact>> {
        let mut artifacts = list_artifacts(self.store, class)?;
        artifacts.reverse();
        Ok(artifacts)
    }

    /// The artifact with the greatest identifier
    pub fn latest(&self, class: BackupClass) -> VaultResult<BackupArtifact> {
        list_artifacts(self.store, class)?
            .pop()
            .ok_or_else(|| VaultError::EmptyBucket {
                namespace: self.store.namespace().to_string(),
            })
    }

    /// Download an artifact of `class` to `destination`
    ///
    /// With no identifier the most recent artifact is used. When
    /// `destination` is an existing directory the artifact is written inside
    /// it as `<id>.tar.gz`.
    pub fn retrieve(
        &self,
        class: BackupClass,
        identifier: Option<&str>,
        destination: &Path,
    ) -> VaultResult<RetrievalOutcome> {
        let artifact = match identifier {
            Some(input) => {
                let id = ArtifactId::resolve(class, input)?;
                if !self.store.exists(&id.key())? {
                    return Ok(self.not_found(&id));
                }
                BackupArtifact {
                    id,
                    namespace: self.store.namespace().to_string(),
                    size_bytes: None,
                }
            }
            None => self.latest(class)?,
        };

        let bytes = match self.store.get(&artifact.storage_path()) {
            Ok(bytes) => bytes,
            // Deleted between the existence check and the download
            Err(err) if err.is_not_found() => return Ok(self.not_found(&artifact.id)),
            Err(err) => return Err(err),
        };

        let destination = if destination.is_dir() {
            destination.join(artifact.id.file_name())
        } else {
            destination.to_path_buf()
        };

        write_atomic(&destination, &bytes).map_err(|e| {
            VaultError::Io(format!("Failed to write {}: {}", destination.display(), e))
        })?;

        info!(
            %class,
            key = %artifact.storage_path(),
            destination = %destination.display(),
            size = bytes.len(),
            "Backup retrieved"
        );

        Ok(RetrievalOutcome::Retrieved {
            artifact: BackupArtifact {
                size_bytes: Some(bytes.len() as u64),
                ..artifact
            },
            destination,
        })
    }

    fn not_found(&self, id: &ArtifactId) -> RetrievalOutcome {
        RetrievalOutcome::NotFound {
            namespace: self.store.namespace().to_string(),
            key: id.key(),
        }
    }
}
