//! Cleanup CLI command

use clap::Args;

use crate::backup::RetentionManager;
use crate::config::settings::Settings;
use crate::error::{VaultError, VaultResult};
use crate::models::ClassSelection;
use crate::store::Backend;

/// Arguments for `webvault cleanup`
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Classes to clean up: db, site or all
    #[arg(default_value = "all")]
    pub target: ClassSelection,

    /// Number of most recent backups to keep (defaults to the configured policy)
    #[arg(short, long)]
    pub keep: Option<u32>,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Handle the cleanup command
///
/// Each deletion is reported on its own line. If any deletion failed the
/// command returns `PartialDeletionFailure` after processing every class.
pub fn handle_cleanup_command(
    settings: &Settings,
    backend: &dyn Backend,
    args: CleanupArgs,
) -> VaultResult<()> {
    let keep_count = args.keep.unwrap_or(settings.retention.keep_count);
    let mut failed = Vec::new();

    for class in args.target.classes() {
        let namespace = settings.namespace_for(class);
        let store = backend.open(&namespace)?;
        let manager = RetentionManager::new(store.as_ref());

        if args.dry_run {
            let plan = manager.plan(class, keep_count)?;

            println!("Cleanup Summary: {}", namespace);
            println!("Retention policy: keep {}", keep_count);
            println!("Current backups: {}", plan.keep.len() + plan.delete.len());
            if plan.delete.is_empty() {
                println!("Nothing to delete.");
            } else {
                println!("To be deleted ({}):", plan.delete.len());
                for artifact in &plan.delete {
                    println!("  {}", artifact.storage_path());
                }
            }
            println!();
            continue;
        }

        let report = manager.cleanup(class, keep_count)?;

        for artifact in &report.deleted {
            println!("Deleted {}/{}", namespace, artifact.storage_path());
        }
        for (artifact, cause) in &report.failed {
            println!("Failed to delete {}/{}: {}", namespace, artifact.storage_path(), cause);
        }
        println!(
            "{}: kept {}, deleted {}",
            namespace,
            report.kept.len(),
            report.deleted.len()
        );

        failed.extend(report.failed.iter().map(|(artifact, _)| artifact.storage_path()));
    }

    if args.dry_run {
        println!("To delete these backups, run again without --dry-run.");
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(VaultError::PartialDeletionFailure { failed })
    }
}
