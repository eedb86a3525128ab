pub mod env;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use market_loader_common::{Backend, Error};
use market_loader_db::store::{PgParams, StoreSettings};
use std::path::{Path, PathBuf};

use self::env::EnvSource;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./market-loader.toml", "~/.config/market-loader/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Build the environment snapshot, layering `env_file` (or `./.env` when it
/// exists) over the process environment.
pub fn load_env(env_file: Option<&Path>) -> Result<EnvSource> {
    let process = EnvSource::from_process();

    let env = match env_file {
        Some(path) => process.with_dotenv(path)?,
        None if Path::new(".env").exists() => process.with_dotenv(Path::new(".env"))?,
        None => process,
    };

    Ok(env)
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.database.schema.trim().is_empty() {
        anyhow::bail!("database.schema cannot be empty");
    }

    if config.database.port == Some(0) {
        anyhow::bail!("database.port cannot be 0");
    }

    if config.database.backend == Backend::Sqlite
        && config.database.sqlite_path.as_os_str().is_empty()
    {
        anyhow::bail!("database.sqlite_path cannot be empty for the sqlite backend");
    }

    Ok(())
}

/// Merge file values, the environment and command-line overrides into the
/// settings for one run.
pub fn resolve(
    config: &Config,
    env: &EnvSource,
    overrides: &Overrides,
) -> market_loader_common::Result<Settings> {
    let backend = overrides.backend.unwrap_or(config.database.backend);

    let store = match backend {
        Backend::Postgres => StoreSettings::Postgres(resolve_postgres(config, env)?),
        Backend::Sqlite => StoreSettings::Sqlite {
            path: overrides
                .sqlite_path
                .clone()
                .unwrap_or_else(|| config.database.sqlite_path.clone()),
        },
    };

    Ok(Settings {
        store,
        schema: config.database.schema.clone(),
        csv_dir: resolve_csv_dir(config, env, overrides.csv_dir.as_deref()),
        mode: overrides.mode.unwrap_or(config.load.mode),
        on_bulk_failure: overrides
            .on_bulk_failure
            .unwrap_or(config.load.on_bulk_failure),
    })
}

/// Source directory: command line, then `MARKET_CSV_DIR`, then the file.
pub fn resolve_csv_dir(config: &Config, env: &EnvSource, cli: Option<&Path>) -> PathBuf {
    let csv_dir = cli
        .map(Path::to_path_buf)
        .or_else(|| env.get(&env::CSV_DIR).map(PathBuf::from))
        .unwrap_or_else(|| config.load.csv_dir.clone());

    expand_path(&csv_dir)
}

/// Resolve PostgreSQL parameters; every missing credential is reported at once.
pub fn resolve_postgres(config: &Config, env: &EnvSource) -> market_loader_common::Result<PgParams> {
    let db = &config.database;
    let from_file = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let host = env
        .get(&env::HOST)
        .or_else(|| from_file(&db.host))
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let port = match env.get(&env::PORT) {
        Some(raw) => raw.parse::<u16>().map_err(|_| {
            Error::config(format!("invalid {}: '{raw}'", env::PORT.describe()))
        })?,
        None => db.port.unwrap_or(5432),
    };

    let dbname = env.get(&env::DATABASE).or_else(|| from_file(&db.dbname));
    let user = env.get(&env::USER).or_else(|| from_file(&db.user));
    let password = env.get(&env::PASSWORD).or_else(|| from_file(&db.password));

    match (dbname, user, password) {
        (Some(dbname), Some(user), Some(password)) => Ok(PgParams {
            host: normalize_host(&host),
            port,
            dbname,
            user,
            password,
        }),
        (dbname, user, password) => {
            let missing: Vec<String> = [
                (dbname.is_none(), env::DATABASE),
                (user.is_none(), env::USER),
                (password.is_none(), env::PASSWORD),
            ]
            .iter()
            .filter(|(absent, _)| *absent)
            .map(|(_, setting)| setting.describe())
            .collect();

            Err(Error::config(format!(
                "missing database settings: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Pin `localhost` to the IPv4 loopback address.
fn normalize_host(host: &str) -> String {
    if host.eq_ignore_ascii_case("localhost") {
        "127.0.0.1".to_string()
    } else {
        host.to_string()
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}
