//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup, retrieval and
//! retention managers.

pub mod backup;
pub mod cleanup;
pub mod list;
pub mod retrieve;
pub mod setup;

pub use backup::{handle_backup_command, BackupArgs};
pub use cleanup::{handle_cleanup_command, CleanupArgs};
pub use list::{handle_list_command, ListArgs};
pub use retrieve::{handle_retrieve_command, RetrieveArgs};
pub use setup::{handle_config_command, handle_init_command};
