//! Backup CLI command

use clap::Args;

use crate::backup::{ArchiveBuilder, BackupOrchestrator, RetentionManager};
use crate::config::paths::VaultPaths;
use crate::config::settings::Settings;
use crate::display::format_size;
use crate::error::{VaultError, VaultResult};
use crate::models::{BackupClass, ClassSelection, RunContext};
use crate::process::ProcessRunner;
use crate::store::Backend;

/// Arguments for `webvault backup`
#[derive(Args, Debug)]
pub struct BackupArgs {
    /// What to back up: db, site or all
    #[arg(default_value = "all")]
    pub target: ClassSelection,

    /// Apply the retention policy to each class that was backed up
    #[arg(long)]
    pub prune: bool,
}

/// Handle the backup command
///
/// Every selected class is attempted. When any class fails, the first
/// failure is returned after the others have been reported.
pub fn handle_backup_command(
    paths: &VaultPaths,
    settings: &Settings,
    backend: &dyn Backend,
    runner: &dyn ProcessRunner,
    context: RunContext,
    args: BackupArgs,
) -> VaultResult<()> {
    let builder = ArchiveBuilder::new(
        runner,
        settings.staging_root(paths),
        settings.compression.clone(),
        context,
    );
    let orchestrator = BackupOrchestrator::new(builder, backend, settings);

    println!("Starting backup run {}", context.stamp());
    let outcomes = orchestrator.backup_all(&args.target.classes());

    let mut first_error = None;
    let mut uploaded = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(artifact) => {
                println!(
                    "  {}: uploaded {} to {} ({})",
                    outcome.class,
                    artifact.storage_path(),
                    artifact.namespace,
                    format_size(artifact.size_bytes.unwrap_or(0)),
                );
                uploaded.push(artifact.namespace);
            }
            Err(err) => {
                println!("  {}: FAILED ({})", outcome.class, err);
                first_error.get_or_insert(err);
            }
        }
    }

    if args.prune {
        let mut failed = Vec::new();

        for class in args.target.classes() {
            let namespace = settings.namespace_for(class);
            // Never prune a class whose new backup did not land
            if !uploaded.contains(&namespace) {
                continue;
            }

            match prune_class(settings, backend, class, &namespace) {
                Ok(keys) => failed.extend(keys),
                Err(err) => {
                    println!("  {}: prune FAILED ({})", class, err);
                    first_error.get_or_insert(err);
                }
            }
        }

        if !failed.is_empty() {
            first_error.get_or_insert(VaultError::PartialDeletionFailure { failed });
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            println!("Backup complete.");
            Ok(())
        }
    }
}

/// Apply retention to one class, returning the keys that could not be deleted
fn prune_class(
    settings: &Settings,
    backend: &dyn Backend,
    class: BackupClass,
    namespace: &str,
) -> VaultResult<Vec<String>> {
    let store = backend.open(namespace)?;
    let report = RetentionManager::new(store.as_ref()).cleanup(class, settings.retention.keep_count)?;

    println!(
        "  {}: kept {}, deleted {} old backup(s)",
        class,
        report.kept.len(),
        report.deleted.len()
    );
    for (artifact, cause) in &report.failed {
        println!("  {}: failed to delete {} ({})", class, artifact.storage_path(), cause);
    }

    Ok(report
        .failed
        .iter()
        .map(|(artifact, _)| artifact.storage_path())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{FakeRunner, ProcessOutput};
    use crate::store::{MemoryBackend, ObjectStore};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.namespace = "myblog".into();
        settings.database.command = vec!["dump".into(), "{output}".into()];
        settings.site.command = vec!["copy".into(), "{output}".into()];
        settings.retention.keep_count = 2;
        settings
    }

    fn runner() -> FakeRunner {
        FakeRunner::new()
            .respond("dump", |spec| {
                std::fs::write(&spec.args[0], b"dump").unwrap();
                ProcessOutput::ok()
            })
            .respond("copy", |spec| {
                std::fs::create_dir_all(&spec.args[0]).unwrap();
                ProcessOutput::ok()
            })
            .respond("tar", |spec| {
                std::fs::write(&spec.args[1], b"gz").unwrap();
                ProcessOutput::ok()
            })
    }

    /// Backend whose second open of `failing` (the prune pass) fails
    struct FlakyBackend {
        inner: MemoryBackend,
        failing: &'static str,
        opens: std::cell::Cell<usize>,
    }

    impl Backend for FlakyBackend {
        fn open(&self, namespace: &str) -> VaultResult<Box<dyn ObjectStore>> {
            if namespace == self.failing {
                self.opens.set(self.opens.get() + 1);
                if self.opens.get() > 1 {
                    return Err(VaultError::storage("open", namespace, "connection reset"));
                }
            }
            self.inner.open(namespace)
        }
    }

    fn seed(backend: &MemoryBackend, namespace: &str, keys: &[&str]) {
        let store = backend.store(namespace);
        for key in keys {
            store.put(key, b"old").unwrap();
        }
    }

    fn context() -> RunContext {
        RunContext::at(Utc.with_ymd_and_hms(2023, 1, 4, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_backup_all_with_prune() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = MemoryBackend::new();
        let db = backend.store("myblog_db");
        for key in ["db.20230101000000", "db.20230102000000", "db.20230103000000"] {
            db.put(key, b"old").unwrap();
        }

        handle_backup_command(
            &paths,
            &settings(),
            &backend,
            &runner(),
            context(),
            BackupArgs {
                target: ClassSelection::All,
                prune: true,
            },
        )
        .unwrap();

        assert_eq!(
            backend.keys("myblog_db"),
            vec!["db.20230103000000", "db.20230104000000"]
        );
        assert_eq!(backend.keys("myblog_site"), vec!["site.20230104000000"]);
    }

    #[test]
    fn test_failed_class_is_returned_and_not_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = MemoryBackend::new();
        let db = backend.store("myblog_db");
        for key in ["db.20230101000000", "db.20230102000000", "db.20230103000000"] {
            db.put(key, b"old").unwrap();
        }
        let runner = runner().exit_with("dump", 2);

        let err = handle_backup_command(
            &paths,
            &settings(),
            &backend,
            &runner,
            context(),
            BackupArgs {
                target: ClassSelection::All,
                prune: true,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            VaultError::ProducerFailure {
                class: BackupClass::Database,
                ..
            }
        ));
        assert_eq!(backend.keys("myblog_db").len(), 3);
        assert_eq!(backend.keys("myblog_site"), vec!["site.20230104000000"]);
    }

    #[test]
    fn test_prune_failure_does_not_stop_other_classes() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let inner = MemoryBackend::new();
        seed(&inner, "myblog_db", &["db.20230101000000", "db.20230102000000"]);
        seed(&inner, "myblog_site", &["site.20230101000000", "site.20230102000000"]);
        let backend = FlakyBackend {
            inner: inner.clone(),
            failing: "myblog_db",
            opens: Default::default(),
        };

        let err = handle_backup_command(
            &paths,
            &settings(),
            &backend,
            &runner(),
            context(),
            BackupArgs {
                target: ClassSelection::All,
                prune: true,
            },
        )
        .unwrap_err();

        assert!(err.is_storage());
        assert_eq!(inner.keys("myblog_db").len(), 3);
        assert_eq!(
            inner.keys("myblog_site"),
            vec!["site.20230102000000", "site.20230104000000"]
        );
    }

    #[test]
    fn test_prune_failure_keeps_earlier_backup_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let inner = MemoryBackend::new();
        let backend = FlakyBackend {
            inner: inner.clone(),
            failing: "myblog_site",
            opens: Default::default(),
        };
        let runner = runner().exit_with("dump", 2);

        let err = handle_backup_command(
            &paths,
            &settings(),
            &backend,
            &runner,
            context(),
            BackupArgs {
                target: ClassSelection::All,
                prune: true,
            },
        )
        .unwrap_err();

        assert!(matches!(err, VaultError::ProducerFailure { .. }));
        assert_eq!(inner.keys("myblog_site"), vec!["site.20230104000000"]);
    }
}
