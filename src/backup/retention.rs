//! Retention management
//!
//! Keeps the N most recent artifacts of a class and deletes the rest.
//! Deletion is best-effort per artifact: one failed delete is recorded and
//! the remaining excess artifacts are still deleted.

use tracing::{info, warn};

use super::catalog::list_artifacts;
use crate::error::{VaultError, VaultResult};
use crate::models::{BackupArtifact, BackupClass};
use crate::store::ObjectStore;

/// Split of a class's artifacts into kept and excess
#[derive(Debug, Clone, Default)]
pub struct RetentionPlan {
    /// Most recent artifacts, oldest first
    pub keep: Vec<BackupArtifact>,
    /// Excess artifacts to delete, oldest first
    pub delete: Vec<BackupArtifact>,
}

/// Result of applying retention to one class
#[derive(Debug, Clone, Default)]
pub struct RetentionReport {
    pub kept: Vec<BackupArtifact>,
    pub deleted: Vec<BackupArtifact>,
    /// Artifacts whose deletion failed, with the cause
    pub failed: Vec<(BackupArtifact, String)>,
}

impl RetentionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// `PartialDeletionFailure` naming every key that could not be deleted
    pub fn into_result(self) -> VaultResult<RetentionReport> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(VaultError::PartialDeletionFailure {
            failed: self
                .failed
                .iter()
                .map(|(artifact, _)| artifact.storage_path())
                .collect(),
        })
    }
}

/// Applies retention policies against one namespace
pub struct RetentionManager<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> RetentionManager<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Work out what `cleanup` would delete, without deleting anything
    pub fn plan(&self, class: BackupClass, keep_count: u32) -> VaultResult<RetentionPlan> {
        let mut artifacts = list_artifacts(self.store, class)?;
        let excess = artifacts.len().saturating_sub(keep_count as usize);
        let keep = artifacts.split_off(excess);

        Ok(RetentionPlan {
            keep,
            delete: artifacts,
        })
    }

    /// Delete all but the `keep_count` most recent artifacts of `class`
    pub fn cleanup(&self, class: BackupClass, keep_count: u32) -> VaultResult<RetentionReport> {
        let plan = self.plan(class, keep_count)?;

        if plan.delete.is_empty() {
            info!(%class, namespace = self.store.namespace(), kept = plan.keep.len(), "Nothing to prune");
        }

        let mut report = RetentionReport {
            kept: plan.keep,
            ..Default::default()
        };

        for artifact in plan.delete {
            let key = artifact.storage_path();
            match self.store.delete(&key) {
                Ok(()) => {
                    info!(%class, key = %key, "Deleted old backup");
                    report.deleted.push(artifact);
                }
                Err(err) => {
                    warn!(%class, key = %key, error = %err, "Failed to delete old backup");
                    report.failed.push((artifact, err.to_string()));
                }
            }
        }

        Ok(report)
    }
}
