//! Core data models for webvault
//!
//! Backup classes, artifact identifiers, and the per-run context and
//! lifecycle state.

pub mod artifact;
pub mod class;
pub mod run;

pub use artifact::{ArtifactId, BackupArtifact};
pub use class::{BackupClass, ClassSelection};
pub use run::{RunContext, RunState};
