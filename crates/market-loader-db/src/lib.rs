//! Market-Loader-DB: Table catalog, schema bootstrap, and store backends
//!
//! This crate owns everything that touches the relational store: the static
//! description of the marketing schema, the DDL rendered from it, the CSV
//! reader that feeds the tables, and the [`store::Store`] trait with its
//! PostgreSQL and SQLite implementations.
//!
//! # Modules
//!
//! - `catalog` - Ordered table descriptors and foreign-key order validation
//! - `ddl` - Dialect-specific SQL rendering
//! - `schema` - Atomic, repeatable schema initialization
//! - `csv_source` - Header binding and record streaming for source files
//! - `store` - Store trait plus the `pg` (PostgreSQL) and `sqlite` backends
//!
//! # Example
//!
//! ```
//! use market_loader_db::catalog::{self, TABLES};
//! use market_loader_db::schema::init_schema;
//! use market_loader_db::store::{sqlite::SqliteStore, Store};
//!
//! let mut store = SqliteStore::open_in_memory("marketing").unwrap();
//! init_schema(&mut store, TABLES).unwrap();
//!
//! let campaign = catalog::find("campaign").unwrap();
//! assert_eq!(store.row_count(campaign).unwrap(), 0);
//! ```

pub mod catalog;
pub mod csv_source;
pub mod ddl;
pub mod schema;
pub mod store;
