//! Backup orchestrator
//!
//! Drives one class at a time through `Idle -> Staging -> Compressing ->
//! Uploading -> Done`. Any failure moves the run to `Failed` and is returned
//! verbatim. Staging and compression failures abort before the upload is
//! attempted; an upload failure keeps the local artifact and reports where
//! it is.

use std::fs;

use tracing::{info, warn};

use super::builder::{cleanup_staging, ArchiveBuilder};
use crate::config::settings::Settings;
use crate::error::{VaultError, VaultResult};
use crate::models::{BackupArtifact, BackupClass, RunState};
use crate::store::Backend;

/// Outcome of backing up one class
#[derive(Debug)]
pub struct ClassOutcome {
    pub class: BackupClass,
    /// Final lifecycle state (`Done` or `Failed`)
    pub state: RunState,
    pub result: VaultResult<BackupArtifact>,
}

impl ClassOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sequences archive building and upload for each class of a run
pub struct BackupOrchestrator<'a> {
    builder: ArchiveBuilder<'a>,
    backend: &'a dyn Backend,
    settings: &'a Settings,
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(builder: ArchiveBuilder<'a>, backend: &'a dyn Backend, settings: &'a Settings) -> Self {
        Self {
            builder,
            backend,
            settings,
        }
    }

    /// Back up one class
    pub fn backup(&self, class: BackupClass) -> VaultResult<BackupArtifact> {
        self.run_class(class).result
    }

    /// Back up each class in turn with the run's shared identifier stamp
    ///
    /// A failing class does not stop the following ones.
    pub fn backup_all(&self, classes: &[BackupClass]) -> Vec<ClassOutcome> {
        classes.iter().map(|&class| self.run_class(class)).collect()
    }

    /// Back up one class and report its final state
    pub fn run_class(&self, class: BackupClass) -> ClassOutcome {
        let mut state = RunState::Idle;
        let result = self.drive(class, &mut state);

        match &result {
            Ok(artifact) => info!(
                %class,
                key = %artifact.storage_path(),
                namespace = %artifact.namespace,
                size = artifact.size_bytes.unwrap_or(0),
                "Backup uploaded"
            ),
            Err(err) => {
                state.fail(err.to_string());
                warn!(%class, error = %err, "Backup failed");
            }
        }

        self.builder.cleanup_run_dir();

        ClassOutcome {
            class,
            state,
            result,
        }
    }

    fn drive(&self, class: BackupClass, state: &mut RunState) -> VaultResult<BackupArtifact> {
        let namespace = self.settings.namespace_for(class);
        let store = self.backend.open(&namespace)?;
        let id = self.builder.context().artifact_id(class);
        let key = id.key();

        if store.exists(&key)? {
            return Err(VaultError::ArtifactExists { namespace, key });
        }

        advance(state, RunState::Staging, class)?;
        let staging = match self.builder.stage(class, self.settings.producer(class)) {
            Ok(path) => path,
            Err(err) => {
                cleanup_staging(&[self.builder.staging_path(class)]);
                return Err(err);
            }
        };

        advance(state, RunState::Compressing, class)?;
        let artifact = match self.builder.compress(&staging) {
            Ok(path) => path,
            Err(err) => {
                cleanup_staging(&[staging]);
                return Err(err);
            }
        };
        cleanup_staging(&[staging]);

        advance(state, RunState::Uploading, class)?;
        let upload = fs::read(&artifact)
            .map_err(|e| VaultError::Io(format!("Failed to read artifact {}: {}", artifact.display(), e)))
            .and_then(|bytes| store.put(&key, &bytes).map(|_| bytes.len() as u64));

        let size_bytes = match upload {
            Ok(size) => size,
            Err(source) => {
                return Err(VaultError::Upload {
                    artifact,
                    source: Box::new(source),
                });
            }
        };
        cleanup_staging(&[artifact]);

        advance(state, RunState::Done, class)?;
        Ok(BackupArtifact {
            id,
            namespace,
            size_bytes: Some(size_bytes),
        })
    }
}

fn advance(state: &mut RunState, next: RunState, class: BackupClass) -> VaultResult<()> {
    info!(%class, from = %state, to = %next, "Backup state change");
    state.advance(next)
}
