//! Run context and backup lifecycle state
//!
//! A `RunContext` is created once per invocation and passed explicitly to
//! everything that needs the run's timestamp, so a combined db + site run
//! produces correlated identifiers.

use chrono::{DateTime, Utc};
use std::fmt;

use super::artifact::{ArtifactId, STAMP_FORMAT};
use super::class::BackupClass;
use crate::error::{VaultError, VaultResult};

/// Per-invocation context shared by every class backed up in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Start a run now
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Start a run at a fixed time
    pub fn at(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    /// Timestamp part shared by every identifier of this run
    pub fn stamp(&self) -> String {
        self.started_at.format(STAMP_FORMAT).to_string()
    }

    /// Identifier of the artifact this run produces for a class
    pub fn artifact_id(&self, class: BackupClass) -> ArtifactId {
        ArtifactId::new(class, self.started_at)
    }

    /// Name of this run's private staging directory
    pub fn staging_dir_name(&self) -> String {
        format!("run-{}", self.stamp())
    }
}

/// Lifecycle of a single class backup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Staging,
    Compressing,
    Uploading,
    Done,
    Failed(String),
}

impl RunState {
    /// `Done` and `Failed` accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Move to the next lifecycle stage
    pub fn advance(&mut self, next: RunState) -> VaultResult<()> {
        let allowed = matches!(
            (&*self, &next),
            (Self::Idle, Self::Staging)
                | (Self::Staging, Self::Compressing)
                | (Self::Compressing, Self::Uploading)
                | (Self::Uploading, Self::Done)
        );

        if !allowed {
            return Err(VaultError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }

        *self = next;
        Ok(())
    }

    /// Record a failure; a terminal state is left untouched
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.is_terminal() {
            *self = Self::Failed(reason.into());
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Staging => write!(f, "staging"),
            Self::Compressing => write!(f, "compressing"),
            Self::Uploading => write!(f, "uploading"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
