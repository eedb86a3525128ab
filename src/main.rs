mod cli;

use market_loader::config::{self, env::EnvSource, Config, Overrides, Settings};
use market_loader::loader::{LoadProgress, LoadSettings, Loader};
use market_loader_db::catalog::TABLES;
use market_loader_db::csv_source::count_rows;
use market_loader_db::ddl::Dialect;
use market_loader_db::schema;
use market_loader_db::store::{self, Store};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "market_loader=debug,market_loader_db=debug,market_loader_common=debug".to_string()
        } else {
            "market_loader=info,market_loader_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Load {
            csv_dir,
            mode,
            on_bulk_failure,
            store,
        } => {
            let overrides = Overrides {
                csv_dir,
                mode,
                on_bulk_failure,
                ..store.overrides()
            };
            let settings = resolve_settings(&config, cli.env_file.as_deref(), &overrides)?;
            load(&settings)
        }
        Commands::Init { store } => {
            let settings = resolve_settings(&config, cli.env_file.as_deref(), &store.overrides())?;
            init(&settings)
        }
        Commands::Plan { csv_dir } => {
            let env = config::load_env(cli.env_file.as_deref())?;
            let csv_dir = config::resolve_csv_dir(&config, &env, csv_dir.as_deref());
            plan(&csv_dir)
        }
        Commands::Schema { dialect } => print_schema(&config, dialect),
        Commands::Counts { store } => {
            let settings = resolve_settings(&config, cli.env_file.as_deref(), &store.overrides())?;
            counts(&settings)
        }
    }
}

fn resolve_settings(
    config: &Config,
    env_file: Option<&Path>,
    overrides: &Overrides,
) -> Result<Settings> {
    let env: EnvSource = config::load_env(env_file)?;
    let settings = config::resolve(config, &env, overrides)?;
    tracing::debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

fn open_store(settings: &Settings) -> Result<Box<dyn Store>> {
    tracing::info!(
        "Connecting to {} store (schema {})",
        settings.store.backend(),
        settings.schema
    );
    let store = store::connect(&settings.store, &settings.schema)
        .with_context(|| format!("Failed to open {} store", settings.store.backend()))?;
    Ok(store)
}

fn init_schema(store: &mut dyn Store) -> Result<usize> {
    let created = schema::init_schema(store, TABLES).context("Failed to initialize schema")?;
    Ok(created)
}

fn load(settings: &Settings) -> Result<()> {
    let mut store = open_store(settings)?;
    init_schema(store.as_mut())?;

    let load_settings = LoadSettings {
        csv_dir: settings.csv_dir.clone(),
        mode: settings.mode,
        on_bulk_failure: settings.on_bulk_failure,
    };

    let report = Loader::new(store.as_mut(), load_settings)
        .with_progress_callback(Box::new(print_progress))
        .run(TABLES)
        .context("Load aborted")?;

    println!("All done.");
    println!("{}", report.summary());

    Ok(())
}

fn print_progress(progress: &LoadProgress<'_>) {
    match progress {
        LoadProgress::Started { table, .. } => {
            println!("Loading {} -> {}", table.source_file, table.name);
        }
        LoadProgress::FallingBack { reason, .. } => {
            println!("  bulk copy failed ({}); falling back to row inserts", reason);
        }
        LoadProgress::Finished(report) => match report.path() {
            Some(path) => println!("  {} ok: {} rows", path, report.rows()),
            None => println!("  skipped"),
        },
    }
}

fn init(settings: &Settings) -> Result<()> {
    let mut store = open_store(settings)?;
    let created = init_schema(store.as_mut())?;

    println!(
        "Schema \"{}\" ready: {} tables created, {} already present",
        settings.schema,
        created,
        TABLES.len() - created
    );

    Ok(())
}

fn plan(csv_dir: &Path) -> Result<()> {
    println!("Load order (csv dir: {}):", csv_dir.display());

    let mut missing = 0;
    for (i, table) in TABLES.iter().enumerate() {
        let path: PathBuf = csv_dir.join(table.source_file);
        let status = if !path.is_file() {
            missing += 1;
            "missing".to_string()
        } else {
            match count_rows(&path) {
                Ok(rows) => format!("{} rows", rows),
                Err(e) => format!("unreadable: {}", e),
            }
        };

        println!(
            "  {:>2}. {:<24} -> {:<18} [{}]",
            i + 1,
            table.source_file,
            table.name,
            status
        );
    }

    println!();
    if missing == 0 {
        println!("All {} source files are present.", TABLES.len());
    } else {
        println!("{} of {} source files are missing.", missing, TABLES.len());
    }

    Ok(())
}

fn print_schema(config: &Config, dialect: Dialect) -> Result<()> {
    print!("{}", schema::render(dialect, &config.database.schema, TABLES));
    Ok(())
}

fn counts(settings: &Settings) -> Result<()> {
    let mut store = open_store(settings)?;

    for table in TABLES {
        if store.table_exists(table.name)? {
            let rows = store
                .row_count(table)
                .with_context(|| format!("Failed to count rows in {}", table.name))?;
            println!("{:<18} {:>10}", table.name, rows);
        } else {
            println!("{:<18} {:>10}", table.name, "(absent)");
        }
    }

    Ok(())
}
