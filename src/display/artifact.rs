//! Artifact display formatting

use chrono::{DateTime, Utc};

use super::{format_age, format_size};
use crate::models::BackupArtifact;

/// Format artifacts as a table, in the order given
pub fn format_artifact_list(artifacts: &[BackupArtifact], now: DateTime<Utc>) -> String {
    if artifacts.is_empty() {
        return "No backups found.".to_string();
    }

    let key_width = artifacts
        .iter()
        .map(|a| a.storage_path().len())
        .max()
        .unwrap_or(10)
        .max(10);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<key_width$}  {:<19}  {:>6}  {:>10}\n",
        "Identifier",
        "Created (UTC)",
        "Age",
        "Size",
        key_width = key_width,
    ));
    output.push_str(&format!(
        "{:-<key_width$}  {:-<19}  {:->6}  {:->10}\n",
        "",
        "",
        "",
        "",
        key_width = key_width,
    ));

    for artifact in artifacts {
        let created_at = artifact.id.created_at();
        let size = artifact
            .size_bytes
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "{:<key_width$}  {:<19}  {:>6}  {:>10}\n",
            artifact.storage_path(),
            created_at.format("%Y-%m-%d %H:%M:%S"),
            format_age(created_at, now),
            size,
            key_width = key_width,
        ));
    }

    output
}
