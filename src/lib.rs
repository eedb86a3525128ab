//! Market-Loader - Ordered CSV bulk loader for the marketing schema
//!
//! This library crate exposes configuration resolution and the ordered
//! loader for the binary and for integration testing. Table layout, DDL and
//! store access live in `market-loader-db`.

pub mod config;
pub mod loader;
