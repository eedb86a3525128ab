use clap::{Args, Parser, Subcommand};
use market_loader_common::{Backend, BulkFailurePolicy, LoadMode};
use market_loader_db::ddl::Dialect;
use std::path::PathBuf;

use market_loader::config::Overrides;

#[derive(Parser)]
#[command(name = "market-loader")]
#[command(author, version, about = "Load marketing CSV exports into the analytics schema")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Env file with connection settings (default: ./.env when present)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the schema if needed, then load every table in order
    Load {
        /// Directory holding the source CSV files
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// What to do with tables that already hold rows
        #[arg(long, value_parser = parse_mode)]
        mode: Option<LoadMode>,

        /// Which bulk copy failures fall back to row inserts
        #[arg(long, value_parser = parse_policy)]
        on_bulk_failure: Option<BulkFailurePolicy>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Create the schema and tables only
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show the load order and whether each source file is present
    Plan {
        /// Directory holding the source CSV files
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },

    /// Print the DDL script
    Schema {
        /// SQL dialect to render
        #[arg(long, default_value = "postgres", value_parser = parse_dialect)]
        dialect: Dialect,
    },

    /// Print the row count of every table
    Counts {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Store backend (postgres or sqlite)
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Database file for the sqlite backend
    #[arg(long)]
    pub sqlite_path: Option<PathBuf>,
}

impl StoreArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend,
            sqlite_path: self.sqlite_path.clone(),
            ..Overrides::default()
        }
    }
}

fn parse_mode(s: &str) -> Result<LoadMode, String> {
    s.parse()
}

fn parse_policy(s: &str) -> Result<BulkFailurePolicy, String> {
    s.parse()
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    s.parse::<Backend>().map(Dialect::from)
}
