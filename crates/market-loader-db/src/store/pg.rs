//! PostgreSQL backend.
//!
//! Bulk loads use `COPY ... FROM STDIN` on the CSV bytes; the fallback binds
//! every value as text and lets the server cast it to the column type.

use std::fmt;
use std::io::Read;

use market_loader_common::{Backend, Error, Result};
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::debug;

use super::{BulkError, Store};
use crate::catalog::{Column, TableDef};
use crate::csv_source::Row;
use crate::ddl::{qualified, Dialect};

/// Resolved PostgreSQL connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct PgParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for PgParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A single PostgreSQL session.
pub struct PgStore {
    client: Client,
    schema: String,
}

impl PgStore {
    /// Connect without TLS and bind the session to `schema`.
    pub fn connect(params: &PgParams, schema: &str) -> Result<Self> {
        debug!(
            host = %params.host,
            port = params.port,
            dbname = %params.dbname,
            user = %params.user,
            "connecting to postgres"
        );

        let client = postgres::Config::new()
            .host(&params.host)
            .port(params.port)
            .dbname(&params.dbname)
            .user(&params.user)
            .password(&params.password)
            .connect(NoTls)
            .map_err(|e| {
                Error::database(format!(
                    "Failed to connect to {}:{}/{}: {}",
                    params.host,
                    params.port,
                    params.dbname,
                    describe(&e)
                ))
            })?;

        Ok(Self {
            client,
            schema: schema.to_string(),
        })
    }
}

impl Store for PgStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    fn execute_script(&mut self, script: &str) -> Result<()> {
        let mut tx = self.client.transaction().map_err(pg_error)?;
        tx.batch_execute(script).map_err(pg_error)?;
        tx.commit().map_err(pg_error)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = $1 AND table_name = $2
                 )",
                &[&self.schema, &table],
            )
            .map_err(pg_error)?;
        Ok(row.get(0))
    }

    fn supports_bulk_copy(&self) -> bool {
        true
    }

    fn bulk_copy(
        &mut self,
        table: &TableDef,
        columns: &[&Column],
        data: &mut dyn Read,
    ) -> std::result::Result<u64, BulkError> {
        let sql = Dialect::copy_from_stdin(&self.schema, table.name, columns);
        debug!(%sql, "starting bulk copy");

        let mut tx = self.client.transaction().map_err(classify)?;
        let mut writer = tx.copy_in(sql.as_str()).map_err(classify)?;
        std::io::copy(data, &mut writer).map_err(|e| BulkError::Failed(Error::Io(e)))?;
        let rows = writer.finish().map_err(classify)?;
        tx.commit().map_err(classify)?;

        Ok(rows)
    }

    fn insert_rows(
        &mut self,
        table: &TableDef,
        columns: &[&Column],
        rows: &mut dyn Iterator<Item = Result<Row>>,
    ) -> Result<u64> {
        let sql = Dialect::Postgres.insert_row(&self.schema, table.name, columns);
        let search_path = Dialect::Postgres.search_path(&self.schema);
        debug!(%sql, "starting row inserts");

        let mut tx = self.client.transaction().map_err(pg_error)?;
        if let Some(set) = search_path {
            tx.batch_execute(&set).map_err(pg_error)?;
        }
        let stmt = tx.prepare(&sql).map_err(pg_error)?;

        let mut inserted = 0;
        for (index, row) in rows.enumerate() {
            let row = row?;
            let params: Vec<&(dyn ToSql + Sync)> =
                row.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
            inserted += tx.execute(&stmt, &params).map_err(|e| {
                Error::database(format!("data row {}: {}", index + 1, describe(&e)))
            })?;
        }

        tx.commit().map_err(pg_error)?;
        Ok(inserted)
    }

    fn row_count(&mut self, table: &TableDef) -> Result<u64> {
        let sql = format!("SELECT count(*) FROM {}", qualified(&self.schema, table.name));
        let row = self.client.query_one(sql.as_str(), &[]).map_err(pg_error)?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    fn truncate(&mut self, tables: &[TableDef]) -> Result<()> {
        if tables.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = tables
            .iter()
            .map(|t| qualified(&self.schema, t.name))
            .collect();
        let sql = format!("TRUNCATE TABLE {}", names.join(", "));

        let mut tx = self.client.transaction().map_err(pg_error)?;
        tx.batch_execute(&sql).map_err(pg_error)?;
        tx.commit().map_err(pg_error)
    }
}

/// Server message with its SQLSTATE, or the client-side error text.
fn describe(err: &postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} [{}]: {}", db.message(), db.code().code(), detail),
            None => format!("{} [{}]", db.message(), db.code().code()),
        },
        None => err.to_string(),
    }
}

fn pg_error(err: postgres::Error) -> Error {
    Error::database(describe(&err))
}

// A store that speaks the wire protocol but rejects COPY (or our COPY
// options) reports it as unsupported; everything else is a real failure.
fn classify(err: postgres::Error) -> BulkError {
    let unsupported = matches!(
        err.code(),
        Some(code) if *code == SqlState::FEATURE_NOT_SUPPORTED || *code == SqlState::SYNTAX_ERROR
    );

    if unsupported {
        BulkError::Unsupported(describe(&err))
    } else {
        BulkError::Failed(pg_error(err))
    }
}
