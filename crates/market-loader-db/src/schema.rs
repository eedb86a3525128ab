//! Schema initialization.
//!
//! The whole catalog is created by one script in one transaction: the
//! namespace, the search path, then every table in catalog order. Each
//! statement is `IF NOT EXISTS`, so running it against a complete schema
//! changes nothing.

use market_loader_common::{Error, Result};
use tracing::info;

use crate::catalog::{self, TableDef};
use crate::ddl::Dialect;
use crate::store::Store;

/// Render the bootstrap script for `tables` in `schema`.
pub fn render(dialect: Dialect, schema: &str, tables: &[TableDef]) -> String {
    dialect.schema_script(schema, tables)
}

/// Create the namespace and every table in `tables`, atomically.
///
/// The table order is validated first; a catalog whose foreign keys point
/// forward is rejected before anything is sent to the store. Any statement
/// failure rolls back the whole script and is reported as
/// [`Error::Schema`].
///
/// # Returns
///
/// * `Ok(usize)` - Number of tables that did not exist before
/// * `Err(Error)` - If validation or any statement fails
pub fn init_schema(store: &mut dyn Store, tables: &[TableDef]) -> Result<usize> {
    catalog::validate_order(tables)?;

    let before = missing_tables(store, tables).map_err(|e| Error::schema(e.to_string()))?;

    let script = render(store.dialect(), store.schema(), tables);
    store
        .execute_script(&script)
        .map_err(|e| Error::schema(e.to_string()))?;

    info!(
        schema = store.schema(),
        backend = %store.backend(),
        created = before.len(),
        total = tables.len(),
        "schema ready"
    );

    Ok(before.len())
}

/// Names of catalog tables not present in the store.
pub fn missing_tables(store: &mut dyn Store, tables: &[TableDef]) -> Result<Vec<&'static str>> {
    let mut missing = Vec::new();
    for table in tables {
        if !store.table_exists(table.name)? {
            missing.push(table.name);
        }
    }
    Ok(missing)
}
