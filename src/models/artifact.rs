//! Artifact identifiers and stored artifacts
//!
//! Identifiers look like `db.20230101000000`: the class key, a dot, and a
//! UTC timestamp with second precision. The identifier doubles as the
//! object key. Ordering always comes from the parsed timestamp, never from
//! the order a storage backend happens to list keys in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::class::BackupClass;
use crate::error::{VaultError, VaultResult};

/// Timestamp layout used in identifiers
pub const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Extension of the compressed artifact on local disk
pub const ARTIFACT_EXTENSION: &str = "tar.gz";

/// Unique, time-ordered identifier of an artifact within a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId {
    class: BackupClass,
    timestamp: NaiveDateTime,
}

impl ArtifactId {
    /// Create an identifier for a class at the given time (sub-second precision is dropped)
    pub fn new(class: BackupClass, at: DateTime<Utc>) -> Self {
        let naive = at.naive_utc();
        let timestamp = naive.with_nanosecond(0).unwrap_or(naive);
        Self { class, timestamp }
    }

    /// Parse a full object key such as `db.20230101000000`
    pub fn parse(key: &str) -> Option<Self> {
        let (class_key, stamp) = key.split_once('.')?;
        let class = BackupClass::parse(class_key)?;
        if class.key() != class_key {
            return None;
        }
        let timestamp = parse_stamp(stamp)?;
        Some(Self { class, timestamp })
    }

    /// Resolve user input for a class: either a full key or a bare stamp
    pub fn resolve(class: BackupClass, input: &str) -> VaultResult<Self> {
        let input = input.trim();
        let id = if input.contains('.') {
            Self::parse(input)
        } else {
            parse_stamp(input).map(|timestamp| Self { class, timestamp })
        };

        match id {
            Some(id) if id.class == class => Ok(id),
            Some(id) => Err(VaultError::InvalidIdentifier(format!(
                "'{}' belongs to class {}, not {}",
                input, id.class, class
            ))),
            None => Err(VaultError::InvalidIdentifier(format!(
                "'{}' (expected {}.YYYYMMDDHHMMSS)",
                input,
                class.key()
            ))),
        }
    }

    pub fn class(&self) -> BackupClass {
        self.class
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.timestamp, Utc)
    }

    /// The 14-digit timestamp part
    pub fn stamp(&self) -> String {
        self.timestamp.format(STAMP_FORMAT).to_string()
    }

    /// Object key for this identifier
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// File name of the compressed artifact on local disk
    pub fn file_name(&self) -> String {
        format!("{}.{}", self, ARTIFACT_EXTENSION)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.key(), self.timestamp.format(STAMP_FORMAT))
    }
}

/// Parse a `YYYYMMDDHHMMSS` stamp
fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    if stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = stamp[0..4].parse().ok()?;
    let month: u32 = stamp[4..6].parse().ok()?;
    let day: u32 = stamp[6..8].parse().ok()?;
    let hour: u32 = stamp[8..10].parse().ok()?;
    let minute: u32 = stamp[10..12].parse().ok()?;
    let second: u32 = stamp[12..14].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(NaiveDateTime::new(date, time))
}

/// An artifact stored in object storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifact {
    /// Identifier (also the object key)
    pub id: ArtifactId,
    /// Namespace the artifact lives in
    pub namespace: String,
    /// Size in bytes, when known
    pub size_bytes: Option<u64>,
}

impl BackupArtifact {
    /// Object key within the namespace
    pub fn storage_path(&self) -> String {
        self.id.key()
    }
}
