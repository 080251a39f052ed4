//! Configuration module for webvault
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - Settings persistence (producers, compression, storage, retention)

pub mod paths;
pub mod settings;

pub use paths::VaultPaths;
pub use settings::Settings;
