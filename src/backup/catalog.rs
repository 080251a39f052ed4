//! Listing stored artifacts of a class

use tracing::warn;

use crate::error::VaultResult;
use crate::models::{ArtifactId, BackupArtifact, BackupClass};
use crate::store::ObjectStore;

/// All artifacts of `class` in `store`, oldest first
///
/// Order comes from the parsed identifiers; keys that are not identifiers
/// of this class are skipped.
pub fn list_artifacts(store: &dyn ObjectStore, class: BackupClass) -> VaultResult<Vec<BackupArtifact>> {
    let prefix = format!("{}.", class.key());
    let mut artifacts: Vec<BackupArtifact> = store
        .list(&prefix)?
        .into_iter()
        .filter_map(|entry| match ArtifactId::parse(&entry.key) {
            Some(id) if id.class() == class => Some(BackupArtifact {
                id,
                namespace: store.namespace().to_string(),
                size_bytes: Some(entry.size_bytes),
            }),
            _ => {
                warn!(namespace = store.namespace(), key = %entry.key, "Skipping unrecognized object");
                None
            }
        })
        .collect();

    artifacts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(artifacts)
}
