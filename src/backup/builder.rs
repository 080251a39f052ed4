//! Archive builder
//!
//! Stages one class into the run's private staging directory by running its
//! producer, compresses the staged content into a single artifact, and
//! removes intermediate files afterwards.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::settings::{
    CompressionSettings, ProducerSettings, ARTIFACT_PLACEHOLDER, OUTPUT_PLACEHOLDER,
};
use crate::error::{VaultError, VaultResult};
use crate::models::artifact::ARTIFACT_EXTENSION;
use crate::models::{BackupClass, RunContext};
use crate::process::{CommandSpec, ProcessRunner};

/// Builds compressed artifacts for one run
pub struct ArchiveBuilder<'a> {
    runner: &'a dyn ProcessRunner,
    staging_root: PathBuf,
    compression: CompressionSettings,
    context: RunContext,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        staging_root: PathBuf,
        compression: CompressionSettings,
        context: RunContext,
    ) -> Self {
        Self {
            runner,
            staging_root,
            compression,
            context,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// This run's private staging directory
    pub fn run_dir(&self) -> PathBuf {
        self.staging_root.join(self.context.staging_dir_name())
    }

    /// Where the producer for `class` writes its output
    pub fn staging_path(&self, class: BackupClass) -> PathBuf {
        self.run_dir().join(self.context.artifact_id(class).key())
    }

    /// Run the producer for `class` into its staging path
    pub fn stage(&self, class: BackupClass, producer: &ProducerSettings) -> VaultResult<PathBuf> {
        let run_dir = self.run_dir();
        fs::create_dir_all(&run_dir).map_err(|e| {
            VaultError::Io(format!(
                "Failed to create staging directory {}: {}",
                run_dir.display(),
                e
            ))
        })?;

        let staging = self.staging_path(class);
        let command = CommandSpec::from_template(
            &producer.command,
            &producer.env,
            &[(OUTPUT_PLACEHOLDER, staging.display().to_string())],
        )
        .ok_or_else(|| VaultError::Config(format!("{} producer command is empty", class)))?;

        info!(%class, command = %command, "Staging backup");

        let output = self
            .runner
            .run(&command)
            .map_err(|e| VaultError::ProducerFailure {
                class,
                exit_code: None,
                stderr: format!("failed to start {}: {}", command.program, e),
            })?;

        if !output.success() {
            return Err(VaultError::ProducerFailure {
                class,
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        if !staging.exists() {
            return Err(VaultError::ProducerFailure {
                class,
                exit_code: output.exit_code,
                stderr: format!("producer left nothing at {}", staging.display()),
            });
        }

        Ok(staging)
    }

    /// Compress a staged file or directory into `<staging>.tar.gz`
    pub fn compress(&self, staging: &Path) -> VaultResult<PathBuf> {
        let staging_name = staging
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| VaultError::Io(format!("Invalid staging path: {}", staging.display())))?;
        let staging_dir = staging.parent().unwrap_or_else(|| Path::new("."));
        let artifact = staging.with_file_name(format!("{}.{}", staging_name, ARTIFACT_EXTENSION));

        let command = CommandSpec::from_template(
            &self.compression.command,
            &Default::default(),
            &[
                (ARTIFACT_PLACEHOLDER, artifact.display().to_string()),
                ("{staging_dir}", staging_dir.display().to_string()),
                ("{staging_name}", staging_name.clone()),
                ("{staging}", staging.display().to_string()),
            ],
        )
        .ok_or_else(|| VaultError::Config("compression command is empty".into()))?;

        info!(artifact = %artifact.display(), "Compressing staged backup");
        debug!(command = %command, "Compression command");

        let output = self
            .runner
            .run(&command)
            .map_err(|e| VaultError::CompressionFailure {
                exit_code: None,
                stderr: format!("failed to start {}: {}", command.program, e),
            })?;

        if !output.success() {
            return Err(VaultError::CompressionFailure {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        if !artifact.is_file() {
            return Err(VaultError::CompressionFailure {
                exit_code: output.exit_code,
                stderr: format!("no artifact written at {}", artifact.display()),
            });
        }

        Ok(artifact)
    }

    /// Remove this run's staging directory if nothing is left in it
    pub fn cleanup_run_dir(&self) {
        let run_dir = self.run_dir();
        match fs::remove_dir(&run_dir) {
            Ok(()) => debug!(dir = %run_dir.display(), "Removed staging directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            // Still holds a kept artifact or another class's files
            Err(e) => debug!(dir = %run_dir.display(), error = %e, "Staging directory kept"),
        }
    }
}

/// Best-effort removal of intermediate files and directories
///
/// Failures are logged and never returned, so they cannot mask the result
/// of the operation that produced the files.
pub fn cleanup_staging(paths: &[PathBuf]) {
    for path in paths {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => debug!(path = %path.display(), "Removed staging path"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staging path"),
        }
    }
}
