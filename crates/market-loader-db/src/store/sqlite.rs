//! SQLite backend.
//!
//! The main database is an empty in-memory one; the configured file is
//! attached under the schema name, so `"marketing"."campaign"` means the
//! same thing here as on PostgreSQL. SQLite has no bulk-load mechanism, so
//! every table goes through row inserts.

use std::io::Read;
use std::path::Path;

use market_loader_common::{Backend, Error, Result};
use rusqlite::Connection;
use tracing::debug;

use super::{BulkError, Store};
use crate::catalog::{Column, TableDef};
use crate::csv_source::Row;
use crate::ddl::{qualified, quote_ident, Dialect};

/// A single SQLite session with the namespace attached.
pub struct SqliteStore {
    conn: Connection,
    schema: String,
}

impl SqliteStore {
    /// Attach the database file at `path` (or `:memory:`) as `schema`.
    pub fn open(path: &Path, schema: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open sqlite connection: {e}")))?;

        // Foreign keys are off by default and cannot be toggled inside a
        // transaction.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| Error::database(e.to_string()))?;

        let target = path.to_string_lossy();
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", quote_ident(schema)),
            [&*target],
        )
        .map_err(|e| Error::database(format!("Failed to attach {target} as {schema}: {e}")))?;

        debug!(path = %target, schema, "opened sqlite store");

        Ok(Self {
            conn,
            schema: schema.to_string(),
        })
    }

    /// In-memory store (useful for tests).
    pub fn open_in_memory(schema: &str) -> Result<Self> {
        Self::open(Path::new(":memory:"), schema)
    }

    /// Underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl Store for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    fn execute_script(&mut self, script: &str) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::database(e.to_string()))?;
        tx.execute_batch(script)
            .map_err(|e| Error::database(e.to_string()))?;
        tx.commit().map_err(|e| Error::database(e.to_string()))
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
            quote_ident(&self.schema)
        );
        let count: i64 = self
            .conn
            .query_row(&sql, [table], |row| row.get(0))
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(count > 0)
    }

    fn supports_bulk_copy(&self) -> bool {
        false
    }

    fn bulk_copy(
        &mut self,
        _table: &TableDef,
        _columns: &[&Column],
        _data: &mut dyn Read,
    ) -> std::result::Result<u64, BulkError> {
        Err(BulkError::Unsupported(
            "sqlite has no bulk copy mechanism".to_string(),
        ))
    }

    fn insert_rows(
        &mut self,
        table: &TableDef,
        columns: &[&Column],
        rows: &mut dyn Iterator<Item = Result<Row>>,
    ) -> Result<u64> {
        let sql = Dialect::Sqlite.insert_row(&self.schema, table.name, columns);
        debug!(%sql, "starting row inserts");

        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| Error::database(e.to_string()))?;

            for (index, row) in rows.enumerate() {
                let row = row?;
                inserted += stmt
                    .execute(rusqlite::params_from_iter(row.iter()))
                    .map_err(|e| Error::database(format!("data row {}: {e}", index + 1)))?
                    as u64;
            }
        }

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
        Ok(inserted)
    }

    fn row_count(&mut self, table: &TableDef) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified(&self.schema, table.name));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    fn truncate(&mut self, tables: &[TableDef]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        // Children first so foreign keys never point at deleted parents.
        for table in tables.iter().rev() {
            tx.execute(&format!("DELETE FROM {}", qualified(&self.schema, table.name)), [])
                .map_err(|e| Error::database(e.to_string()))?;
        }

        tx.commit().map_err(|e| Error::database(e.to_string()))
    }
}
