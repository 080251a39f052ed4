//! Custom error types for webvault
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::BackupClass;

/// The main error type for webvault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local file I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The external dump or copy process exited non-zero (or never started)
    #[error("{class} producer failed ({}): {stderr}", describe_exit(.exit_code))]
    ProducerFailure {
        class: BackupClass,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The compression process exited non-zero or left no artifact behind
    #[error("Compression failed ({}): {stderr}", describe_exit(.exit_code))]
    CompressionFailure { exit_code: Option<i32>, stderr: String },

    /// Object storage transport, auth or permission failure
    #[error("Storage error during {operation} of '{key}': {cause}")]
    Storage {
        operation: &'static str,
        key: String,
        cause: String,
    },

    /// Upload failed after a local artifact was built; the artifact is kept
    #[error("{source} (local artifact kept at {})", .artifact.display())]
    Upload {
        artifact: PathBuf,
        #[source]
        source: Box<VaultError>,
    },

    /// Requested artifact is absent from its namespace
    #[error("Artifact not found in {namespace}: {key}")]
    NotFound { namespace: String, key: String },

    /// Retrieval of "latest" found no artifacts at all
    #[error("No artifacts found in {namespace}")]
    EmptyBucket { namespace: String },

    /// Some retention deletions failed
    #[error("Failed to delete {} artifact(s): {}", .failed.len(), .failed.join(", "))]
    PartialDeletionFailure { failed: Vec<String> },

    /// An artifact with the run's identifier already exists
    #[error("Artifact already exists in {namespace}: {key}")]
    ArtifactExists { namespace: String, key: String },

    /// A string could not be parsed as an artifact identifier
    #[error("Invalid artifact identifier: {0}")]
    InvalidIdentifier(String),

    /// Backup run state machine was driven out of order
    #[error("Invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl VaultError {
    /// Create a storage error for the given operation and key
    pub fn storage(operation: &'static str, key: impl Into<String>, cause: impl ToString) -> Self {
        Self::Storage {
            operation,
            key: key.into(),
            cause: cause.to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from talking to object storage
    pub fn is_storage(&self) -> bool {
        match self {
            Self::Storage { .. } => true,
            Self::Upload { source, .. } => source.is_storage(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for webvault operations
pub type VaultResult<T> = Result<T, VaultError>;
