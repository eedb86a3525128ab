//! Policy enums shared by the store layer and the loader.
//!
//! All enums serialize in kebab-case so the same spelling works in the TOML
//! config file, on the command line, and in log output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do with tables that already hold rows from an earlier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Strict append; primary-key collisions fail the run.
    #[default]
    Append,
    /// Empty every catalog table before loading.
    Truncate,
    /// Leave non-empty tables untouched.
    SkipPopulated,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Truncate => write!(f, "truncate"),
            Self::SkipPopulated => write!(f, "skip-populated"),
        }
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "truncate" => Ok(Self::Truncate),
            "skip-populated" | "skip_populated" => Ok(Self::SkipPopulated),
            other => Err(format!(
                "unknown load mode '{other}' (expected append, truncate or skip-populated)"
            )),
        }
    }
}

/// When a failed bulk copy may fall back to row inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulkFailurePolicy {
    /// Fall back on any bulk failure.
    #[default]
    Fallback,
    /// Fall back only when the store cannot bulk copy at all.
    UnsupportedOnly,
}

impl fmt::Display for BulkFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => write!(f, "fallback"),
            Self::UnsupportedOnly => write!(f, "unsupported-only"),
        }
    }
}

impl FromStr for BulkFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "unsupported-only" | "unsupported_only" => Ok(Self::UnsupportedOnly),
            other => Err(format!(
                "unknown bulk failure policy '{other}' (expected fallback or unsupported-only)"
            )),
        }
    }
}

/// The ingestion path that loaded (or failed to load) a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestPath {
    /// Store-native bulk copy.
    BulkCopy,
    /// Row-by-row parameterized inserts.
    RowInsert,
}

impl fmt::Display for IngestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BulkCopy => write!(f, "bulk-copy"),
            Self::RowInsert => write!(f, "row-insert"),
        }
    }
}

/// Store backend selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// PostgreSQL server, reached over TCP.
    #[default]
    Postgres,
    /// Embedded SQLite file (or `:memory:`).
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!(
                "unknown backend '{other}' (expected postgres or sqlite)"
            )),
        }
    }
}
