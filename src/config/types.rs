use market_loader_common::{Backend, BulkFailurePolicy, LoadMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Store backend (postgres or sqlite)
    #[serde(default)]
    pub backend: Backend,

    /// Namespace holding every table
    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Database name (PGDATABASE / PG_DB override this)
    #[serde(default)]
    pub dbname: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    /// Prefer the environment or a `.env` file over storing this here
    #[serde(default)]
    pub password: Option<String>,

    /// Database file for the sqlite backend (`:memory:` is accepted)
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            schema: default_schema(),
            host: None,
            port: None,
            dbname: None,
            user: None,
            password: None,
            sqlite_path: default_sqlite_path(),
        }
    }
}

fn default_schema() -> String {
    "marketing".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("market-loader.sqlite")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadConfig {
    /// Directory holding the source CSV files
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,

    /// What to do with tables that already hold rows
    #[serde(default)]
    pub mode: LoadMode,

    /// Which bulk copy failures fall back to row inserts
    #[serde(default)]
    pub on_bulk_failure: BulkFailurePolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            csv_dir: default_csv_dir(),
            mode: LoadMode::default(),
            on_bulk_failure: BulkFailurePolicy::default(),
        }
    }
}

fn default_csv_dir() -> PathBuf {
    PathBuf::from("./datasets")
}

/// Values given on the command line; each one wins over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub csv_dir: Option<PathBuf>,
    pub mode: Option<LoadMode>,
    pub on_bulk_failure: Option<BulkFailurePolicy>,
    pub sqlite_path: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: market_loader_db::store::StoreSettings,
    pub schema: String,
    pub csv_dir: PathBuf,
    pub mode: LoadMode,
    pub on_bulk_failure: BulkFailurePolicy,
}
