//! Environment lookups for connection settings.
//!
//! Each setting can be spelled several ways; the first non-empty value wins.
//! A `.env` file is layered over the process environment and takes
//! precedence over it.

use market_loader_common::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// A connection setting and the variable names it can be read from.
#[derive(Debug, Clone, Copy)]
pub struct EnvSetting {
    pub label: &'static str,
    pub names: &'static [&'static str],
}

impl EnvSetting {
    /// `database (PGDATABASE/PG_DB)`
    pub fn describe(&self) -> String {
        format!("{} ({})", self.label, self.names.join("/"))
    }
}

pub const HOST: EnvSetting = EnvSetting {
    label: "host",
    names: &["PGHOST", "PG_HOST"],
};

pub const PORT: EnvSetting = EnvSetting {
    label: "port",
    names: &["PGPORT", "PG_PORT"],
};

pub const DATABASE: EnvSetting = EnvSetting {
    label: "database",
    names: &["PGDATABASE", "PG_DB"],
};

pub const USER: EnvSetting = EnvSetting {
    label: "user",
    names: &["PGUSER", "PG_USER"],
};

pub const PASSWORD: EnvSetting = EnvSetting {
    label: "password",
    names: &["PGPASSWORD", "PG_PASSWORD"],
};

pub const CSV_DIR: EnvSetting = EnvSetting {
    label: "csv directory",
    names: &["MARKET_CSV_DIR"],
};

/// Snapshot of environment variables used for resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs (later pairs replace earlier ones).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Layer the variables of a `.env` file over this snapshot.
    pub fn with_dotenv(mut self, path: &Path) -> Result<Self> {
        let iter = dotenv::from_path_iter(path).map_err(|e| {
            Error::config(format!("Failed to read env file {}: {e}", path.display()))
        })?;

        for item in iter {
            let (key, value) = item.map_err(|e| {
                Error::config(format!("Failed to parse env file {}: {e}", path.display()))
            })?;
            self.vars.insert(key, value);
        }

        Ok(self)
    }

    /// First non-empty, trimmed value among the setting's names.
    pub fn get(&self, setting: &EnvSetting) -> Option<String> {
        setting.names.iter().find_map(|name| {
            self.vars
                .get(*name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }
}
