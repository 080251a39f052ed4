//! webvault - backup, retrieval and retention for a web application
//!
//! This library backs up a web application's database and site files to
//! object storage, retrieves them again, and prunes old backups. Dumping,
//! copying and compressing are delegated to external commands; storage is
//! a filesystem directory or any S3-compatible service.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Backup classes, artifact identifiers, run context and state
//! - `process`: External command execution
//! - `store`: Object storage backends
//! - `backup`: Archive building, orchestration, retrieval and retention
//! - `cli`: Command handlers for the `webvault` binary
//! - `display`: Terminal output formatting
//! - `logging`: Tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use webvault::config::{paths::VaultPaths, settings::Settings};
//! use webvault::store::open_backend;
//!
//! let paths = VaultPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let backend = open_backend(&settings.storage, &paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod file_io;
pub mod logging;
pub mod models;
pub mod process;
pub mod store;

pub use error::{VaultError, VaultResult};
