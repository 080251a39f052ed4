//! Backup, retrieval and retention
//!
//! # Architecture
//!
//! - `ArchiveBuilder`: runs a class's producer into the run's staging
//!   directory and compresses the result into one artifact
//! - `BackupOrchestrator`: drives each class through
//!   staging, compressing and uploading, sharing one run stamp
//! - `RetrievalManager`: finds the latest or a named artifact and downloads it
//! - `RetentionManager`: keeps the N most recent artifacts and deletes the rest
//!
//! # Artifact layout
//!
//! Each class has its own namespace, `<base>_<class>`. Objects in it are
//! keyed by identifier, `<class>.<YYYYMMDDHHMMSS>`, and "most recent" always
//! means greatest identifier, never listing order.
//!
//! # Example
//!
//! ```rust,ignore
//! use webvault::backup::{ArchiveBuilder, BackupOrchestrator, RetentionManager};
//! use webvault::models::{BackupClass, RunContext};
//!
//! let builder = ArchiveBuilder::new(&runner, staging_root, settings.compression.clone(), RunContext::now());
//! let orchestrator = BackupOrchestrator::new(builder, backend.as_ref(), &settings);
//! let artifact = orchestrator.backup(BackupClass::Database)?;
//!
//! let store = backend.open(&artifact.namespace)?;
//! RetentionManager::new(store.as_ref()).cleanup(BackupClass::Database, 10)?;
//! ```

mod builder;
mod catalog;
mod orchestrator;
mod retention;
mod retrieval;

pub use builder::{cleanup_staging, ArchiveBuilder};
pub use catalog::list_artifacts;
pub use orchestrator::{BackupOrchestrator, ClassOutcome};
pub use retention::{RetentionManager, RetentionPlan, RetentionReport};
pub use retrieval::{RetrievalManager, RetrievalOutcome};
