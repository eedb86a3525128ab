//! Store backends.
//!
//! A [`Store`] is one open session against the target database, bound to a
//! single namespace. The loader drives it strictly sequentially: every
//! method that writes runs in its own transaction, which is rolled back if
//! the method returns an error.

pub mod pg;
pub mod sqlite;

use std::io::Read;
use std::path::PathBuf;

use market_loader_common::{Backend, Error, Result};

use crate::catalog::{Column, TableDef};
use crate::csv_source::Row;
use crate::ddl::Dialect;

pub use self::pg::{PgParams, PgStore};
pub use self::sqlite::SqliteStore;

/// Why a bulk copy did not load a table.
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    /// The store has no usable bulk mechanism (missing feature or privilege).
    #[error("bulk copy unavailable: {0}")]
    Unsupported(String),

    /// The bulk copy ran and failed; its transaction was rolled back.
    #[error(transparent)]
    Failed(#[from] Error),
}

impl BulkError {
    /// True when the store could not attempt the copy at all.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// A session against the target store.
pub trait Store {
    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// Namespace all tables live in.
    fn schema(&self) -> &str;

    /// SQL dialect used to render statements.
    fn dialect(&self) -> Dialect {
        Dialect::from(self.backend())
    }

    /// Run a multi-statement script in one transaction.
    fn execute_script(&mut self, script: &str) -> Result<()>;

    /// Whether `table` exists in the namespace.
    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Whether [`Store::bulk_copy`] can work at all.
    fn supports_bulk_copy(&self) -> bool;

    /// Stream a CSV file (header row included) into `table` in one
    /// transaction. `columns` lists the file's columns in header order.
    fn bulk_copy(
        &mut self,
        table: &TableDef,
        columns: &[&Column],
        data: &mut dyn Read,
    ) -> std::result::Result<u64, BulkError>;

    /// Insert rows one statement at a time, in one transaction that first
    /// re-establishes the namespace. Each row holds values for `columns`.
    fn insert_rows(
        &mut self,
        table: &TableDef,
        columns: &[&Column],
        rows: &mut dyn Iterator<Item = Result<Row>>,
    ) -> Result<u64>;

    /// Number of rows currently in `table`.
    fn row_count(&mut self, table: &TableDef) -> Result<u64>;

    /// Empty every table in `tables` in one transaction.
    fn truncate(&mut self, tables: &[TableDef]) -> Result<()>;
}

/// Connection settings for [`connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Postgres(PgParams),
    Sqlite { path: PathBuf },
}

impl StoreSettings {
    pub fn backend(&self) -> Backend {
        match self {
            Self::Postgres(_) => Backend::Postgres,
            Self::Sqlite { .. } => Backend::Sqlite,
        }
    }
}

/// Open a session for `settings`, bound to `schema`.
pub fn connect(settings: &StoreSettings, schema: &str) -> Result<Box<dyn Store>> {
    match settings {
        StoreSettings::Postgres(params) => Ok(Box::new(PgStore::connect(params, schema)?)),
        StoreSettings::Sqlite { path } => Ok(Box::new(SqliteStore::open(path, schema)?)),
    }
}
