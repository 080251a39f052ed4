//! Backup class model
//!
//! A backup class decides which external producer runs and which storage
//! namespace its artifacts live in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical category of backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupClass {
    /// Relational database dump
    Database,
    /// Static site file tree
    Site,
}

impl BackupClass {
    /// All classes, in the order a combined run processes them
    pub const ALL: [BackupClass; 2] = [BackupClass::Database, BackupClass::Site];

    /// Short key used in namespaces and artifact identifiers
    pub fn key(&self) -> &'static str {
        match self {
            Self::Database => "db",
            Self::Site => "site",
        }
    }

    /// Parse a class from its key or a common alias
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "db" | "database" => Some(Self::Database),
            "site" | "files" => Some(Self::Site),
            _ => None,
        }
    }

    /// Storage namespace for this class: `<base>_<key>`
    pub fn namespace(&self, base: &str) -> String {
        format!("{}_{}", base, self.key())
    }
}

impl fmt::Display for BackupClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BackupClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown backup class '{}' (expected db or site)", s))
    }
}

/// Class selection accepted on the command line: one class, or all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassSelection {
    #[default]
    All,
    One(BackupClass),
}

impl ClassSelection {
    /// Expand the selection into the classes it covers
    pub fn classes(&self) -> Vec<BackupClass> {
        match self {
            Self::All => BackupClass::ALL.to_vec(),
            Self::One(class) => vec![*class],
        }
    }
}

impl FromStr for ClassSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::One)
    }
}
