//! Common error type used throughout market-loader.
//!
//! Every failure a load run can hit is one of these variants. Whether a
//! variant is fatal depends on where it surfaces: a [`Error::Header`] raised
//! on the bulk path only triggers the row-insert fallback, while the same
//! error on the fallback path ends the run.

use std::fmt;
use std::path::PathBuf;

use crate::IngestPath;

/// Common error type for market-loader.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid configuration, including missing credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table's source file does not exist.
    #[error("Source file not found for table {table}: {}", path.display())]
    SourceMissing {
        /// Table the file was meant to populate.
        table: String,
        /// Resolved path that was looked up.
        path: PathBuf,
    },

    /// The CSV header row does not fit the target table.
    #[error("Header mismatch for table {table}: {message}")]
    Header {
        /// Target table.
        table: String,
        /// What was wrong with the header.
        message: String,
    },

    /// A CSV record could not be parsed.
    #[error("CSV error in {}: {message}", path.display())]
    Csv {
        /// File being read.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Schema bootstrap failed; nothing was committed.
    #[error("Schema initialization failed: {0}")]
    Schema(String),

    /// The table catalog is inconsistent with its own foreign keys.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A store operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The final ingest path for a table failed.
    #[error("Loading table {table} via {path} failed: {message}")]
    Load {
        /// Target table.
        table: String,
        /// Path that was attempted last.
        path: IngestPath,
        /// Underlying failure.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new Catalog error.
    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a new Header error for `table`.
    pub fn header<T: Into<String>, S: Into<String>>(table: T, msg: S) -> Self {
        Self::Header {
            table: table.into(),
            message: msg.into(),
        }
    }

    /// Create a new SourceMissing error.
    pub fn source_missing<T: Into<String>>(table: T, path: impl Into<PathBuf>) -> Self {
        Self::SourceMissing {
            table: table.into(),
            path: path.into(),
        }
    }

    /// Wrap a failure of the last path attempted for `table`.
    pub fn load<T: Into<String>>(table: T, path: IngestPath, cause: impl fmt::Display) -> Self {
        Self::Load {
            table: table.into(),
            path,
            message: cause.to_string(),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing PG_DB/PGDATABASE");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing PG_DB/PGDATABASE"
        );

        let err = Error::source_missing("product", "/data/Product.csv");
        assert_eq!(
            err.to_string(),
            "Source file not found for table product: /data/Product.csv"
        );

        let err = Error::header("campaign", "unknown column \"colour\"");
        assert_eq!(
            err.to_string(),
            "Header mismatch for table campaign: unknown column \"colour\""
        );

        let err = Error::schema("permission denied for database");
        assert_eq!(
            err.to_string(),
            "Schema initialization failed: permission denied for database"
        );
    }

    #[test]
    fn test_load_error_names_path() {
        let cause = Error::database("duplicate key value violates unique constraint");
        let err = Error::load("campaign", IngestPath::RowInsert, &cause);
        assert_eq!(
            err.to_string(),
            "Loading table campaign via row-insert failed: Database error: duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::database("x"), Error::Database(_)));
        assert!(matches!(Error::catalog("x"), Error::Catalog(_)));
        assert!(matches!(
            Error::source_missing("t", "p"),
            Error::SourceMissing { .. }
        ));
    }
}
