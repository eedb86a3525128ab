//! Market-Loader-Common: Shared error type and load-policy enums.
//!
//! This crate provides functionality used by both the store layer and the
//! loader binary:
//!
//! - **Error Handling**: A single error enum covering configuration, source
//!   files, schema bootstrap and store failures, plus a result alias
//! - **Policy Types**: Enums for the re-run mode, the bulk failure policy,
//!   the ingest path taken for a table, and the store backend
//!
//! # Examples
//!
//! ```
//! use market_loader_common::{Error, LoadMode, Result};
//!
//! let mode: LoadMode = "truncate".parse().unwrap();
//! assert_eq!(mode, LoadMode::Truncate);
//!
//! fn example() -> Result<()> {
//!     Err(Error::config("missing PG_USER/PGUSER"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
