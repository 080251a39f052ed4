//! Retrieve CLI command

use clap::Args;
use std::path::PathBuf;

use crate::backup::{RetrievalManager, RetrievalOutcome};
use crate::config::settings::Settings;
use crate::display::format_size;
use crate::error::{VaultError, VaultResult};
use crate::models::BackupClass;
use crate::store::Backend;

/// Arguments for `webvault retrieve`
#[derive(Args, Debug)]
pub struct RetrieveArgs {
    /// Class to retrieve: db or site
    pub class: BackupClass,

    /// Identifier to fetch (`db.20230101000000` or `20230101000000`); latest if omitted
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// Destination file, or directory to write `<identifier>.tar.gz` into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Handle the retrieve command
///
/// A missing identifier is returned as `VaultError::NotFound` so the
/// process exits non-zero; nothing is written in that case.
pub fn handle_retrieve_command(
    settings: &Settings,
    backend: &dyn Backend,
    args: RetrieveArgs,
) -> VaultResult<()> {
    let store = backend.open(&settings.namespace_for(args.class))?;
    let manager = RetrievalManager::new(store.as_ref());

    match manager.retrieve(args.class, args.identifier.as_deref(), &args.output)? {
        RetrievalOutcome::Retrieved {
            artifact,
            destination,
        } => {
            println!(
                "Retrieved {} from {} ({})",
                artifact.storage_path(),
                artifact.namespace,
                format_size(artifact.size_bytes.unwrap_or(0)),
            );
            println!("Location: {}", destination.display());
            Ok(())
        }
        RetrievalOutcome::NotFound { namespace, key } => {
            Err(VaultError::NotFound { namespace, key })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, ObjectStore};
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings {
            namespace: "myblog".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_missing_identifier_fails_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let backend = MemoryBackend::new();
        backend
            .store("myblog_site")
            .put("site.20230101000000", b"old")
            .unwrap();

        let err = handle_retrieve_command(
            &settings(),
            &backend,
            RetrieveArgs {
                class: BackupClass::Site,
                identifier: Some("site.20230105120000".into()),
                output: temp_dir.path().to_path_buf(),
            },
        )
        .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_retrieve_latest() {
        let temp_dir = TempDir::new().unwrap();
        let backend = MemoryBackend::new();
        let store = backend.store("myblog_db");
        store.put("db.20230101000000", b"first").unwrap();
        store.put("db.20230102000000", b"second").unwrap();

        handle_retrieve_command(
            &settings(),
            &backend,
            RetrieveArgs {
                class: BackupClass::Database,
                identifier: None,
                output: temp_dir.path().to_path_buf(),
            },
        )
        .unwrap();

        let written = temp_dir.path().join("db.20230102000000.tar.gz");
        assert_eq!(std::fs::read(written).unwrap(), b"second");
    }
}
