//! User settings for webvault
//!
//! A single JSON document describing the producer commands per backup
//! class, the compression command, where staging happens, where artifacts
//! are stored, and the default retention policy. Every field has a default,
//! so a partial file is valid.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;
use crate::file_io::write_json_atomic;
use crate::models::BackupClass;

/// Placeholder in producer commands for the staging output path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Placeholder in the compression command for the artifact path
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

/// How many artifacts to keep per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Number of most recent artifacts to keep
    pub keep_count: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep_count: 10 }
    }
}

/// External command producing the staged content of one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSettings {
    /// Program and arguments; `{output}` is replaced with the staging path
    pub command: Vec<String>,

    /// Extra environment, e.g. `MYSQL_PWD`, kept out of argv
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// External command turning a staging path into one compressed artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Program and arguments; supports `{artifact}`, `{staging}`,
    /// `{staging_dir}` and `{staging_name}`
    pub command: Vec<String>,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            command: ["tar", "-czf", "{artifact}", "-C", "{staging_dir}", "{staging_name}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Connection settings for an S3-compatible service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint (MinIO, R2, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Single bucket holding every namespace as a prefix; without it each
    /// namespace is its own bucket, named in lowercase with `_` turned into
    /// `-` (`myblog_db` -> `myblog-db`), and those buckets must already exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key_path: Option<PathBuf>,

    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Where artifacts are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageSettings {
    /// One directory per namespace; defaults to `<base>/store`
    Filesystem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
    },
    /// S3-compatible object storage
    S3(S3Settings),
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::Filesystem { root: None }
    }
}

/// User settings for webvault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Base name of the storage namespaces (`<namespace>_db`, `<namespace>_site`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Staging root; defaults to `<base>/staging`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_root: Option<PathBuf>,

    /// Default retention policy
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Database dump producer
    #[serde(default = "default_database_producer")]
    pub database: ProducerSettings,

    /// Site file copy producer
    #[serde(default = "default_site_producer")]
    pub site: ProducerSettings,

    #[serde(default)]
    pub compression: CompressionSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_namespace() -> String {
    "webvault".to_string()
}

fn default_database_producer() -> ProducerSettings {
    ProducerSettings {
        command: ["mysqldump", "--single-transaction", "--result-file={output}", "webvault"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        env: BTreeMap::new(),
    }
}

fn default_site_producer() -> ProducerSettings {
    ProducerSettings {
        command: ["cp", "-r", "/var/www/html", "{output}"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        env: BTreeMap::new(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            namespace: default_namespace(),
            staging_root: None,
            retention: RetentionPolicy::default(),
            database: default_database_producer(),
            site: default_site_producer(),
            compression: CompressionSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        if !paths.settings_file().exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }
        Self::read(paths)
    }

    /// Load settings from a file that must already exist
    ///
    /// Used when the settings file was named explicitly, so a mistyped path
    /// fails instead of silently running with defaults.
    pub fn load_existing(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();
        if !settings_path.is_file() {
            return Err(VaultError::Config(format!(
                "Settings file not found: {}",
                settings_path.display()
            )));
        }
        Self::read(paths)
    }

    fn read(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();
        let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
            VaultError::Io(format!(
                "Failed to read settings file {}: {}",
                settings_path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            VaultError::Config(format!(
                "Failed to parse settings file {}: {}",
                settings_path.display(),
                e
            ))
        })
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Producer for a backup class
    pub fn producer(&self, class: BackupClass) -> &ProducerSettings {
        match class {
            BackupClass::Database => &self.database,
            BackupClass::Site => &self.site,
        }
    }

    /// Storage namespace for a backup class
    pub fn namespace_for(&self, class: BackupClass) -> String {
        class.namespace(&self.namespace)
    }

    /// Resolved staging root
    pub fn staging_root(&self, paths: &VaultPaths) -> PathBuf {
        self.staging_root
            .clone()
            .unwrap_or_else(|| paths.staging_dir())
    }

    /// Check the settings are usable before any command runs
    pub fn validate(&self) -> Result<(), VaultError> {
        let namespace_ok = !self.namespace.is_empty()
            && self
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !namespace_ok {
            return Err(VaultError::Config(format!(
                "namespace must be non-empty and use only letters, digits, '-' or '_': '{}'",
                self.namespace
            )));
        }

        for class in BackupClass::ALL {
            let producer = self.producer(class);
            if producer.command.is_empty() {
                return Err(VaultError::Config(format!("{} producer command is empty", class)));
            }
            if !producer.command.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
                return Err(VaultError::Config(format!(
                    "{} producer command must contain {}",
                    class, OUTPUT_PLACEHOLDER
                )));
            }
        }

        if !self
            .compression
            .command
            .iter()
            .any(|arg| arg.contains(ARTIFACT_PLACEHOLDER))
        {
            return Err(VaultError::Config(format!(
                "compression command must contain {}",
                ARTIFACT_PLACEHOLDER
            )));
        }

        Ok(())
    }
}
