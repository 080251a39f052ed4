//! Init and config CLI commands

use crate::config::paths::VaultPaths;
use crate::config::settings::{ProducerSettings, Settings, StorageSettings};
use crate::error::{VaultError, VaultResult};
use crate::models::BackupClass;
use crate::store::bucket_for_namespace;

/// Handle the init command
///
/// Writes the current settings (defaults when no file exists yet) and
/// creates the local directories they point at.
pub fn handle_init_command(paths: &VaultPaths, settings: &Settings) -> VaultResult<()> {
    println!("Initializing webvault at: {}", paths.base_dir().display());

    let existed = paths.is_initialized();
    settings.save(paths)?;

    let mut dirs = vec![settings.staging_root(paths)];
    if let StorageSettings::Filesystem { root } = &settings.storage {
        dirs.push(root.clone().unwrap_or_else(|| paths.store_dir()));
    }
    for dir in dirs {
        std::fs::create_dir_all(&dir)
            .map_err(|e| VaultError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
    }

    if existed {
        println!("Existing settings kept: {}", paths.settings_file().display());
    } else {
        println!("Default settings written: {}", paths.settings_file().display());
        println!();
        println!("Edit the producer commands before the first backup:");
        for class in BackupClass::ALL {
            println!("  {:<4} {}", class, describe_producer(settings.producer(class)));
        }
    }
    println!("Initialization complete!");

    Ok(())
}

/// Handle the config command
pub fn handle_config_command(paths: &VaultPaths, settings: &Settings) -> VaultResult<()> {
    println!("webvault Configuration");
    println!("======================");
    println!("Base directory:  {}", paths.base_dir().display());
    println!(
        "Settings file:   {}{}",
        paths.settings_file().display(),
        if paths.is_initialized() { "" } else { " (not written yet)" }
    );
    println!("Staging root:    {}", settings.staging_root(paths).display());
    println!();
    println!("Settings:");
    println!("  Retention: keep {} per class", settings.retention.keep_count);
    for class in BackupClass::ALL {
        println!("  {:<4} namespace: {}", class, settings.namespace_for(class));
        println!("  {:<4} producer:  {}", class, describe_producer(settings.producer(class)));
    }
    println!("  Compression: {}", settings.compression.command.join(" "));

    match &settings.storage {
        StorageSettings::Filesystem { root } => {
            let root = root.clone().unwrap_or_else(|| paths.store_dir());
            println!("  Storage: filesystem at {}", root.display());
        }
        StorageSettings::S3(s3) => {
            println!("  Storage: s3 (region {})", s3.region);
            if let Some(endpoint) = &s3.endpoint {
                println!("    Endpoint: {}", endpoint);
            }
            match &s3.bucket {
                Some(bucket) => println!("    Bucket: {} (namespaces as prefixes)", bucket),
                None => {
                    let buckets: Vec<String> = BackupClass::ALL
                        .iter()
                        .map(|class| bucket_for_namespace(&settings.namespace_for(*class)))
                        .collect();
                    println!("    Buckets: {} (one per namespace)", buckets.join(", "));
                    println!("    Set storage.bucket to keep every namespace in one bucket as a prefix.");
                }
            }
        }
    }

    if let Err(err) = settings.validate() {
        println!();
        println!("WARNING: {}", err);
    }

    Ok(())
}

/// Producer argv, with environment variable names but never their values
fn describe_producer(producer: &ProducerSettings) -> String {
    let command = producer.command.join(" ");
    if producer.env.is_empty() {
        return command;
    }
    let env: Vec<&str> = producer.env.keys().map(String::as_str).collect();
    format!("{} (env: {})", command, env.join(", "))
}
