//! Ingestion strategies.
//!
//! A strategy moves one CSV file into one table inside a single store
//! transaction. [`BulkCopy`] streams the raw file through the store's native
//! bulk mechanism; [`RowInsert`] parses records and inserts them one by one.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use market_loader_common::{Error, IngestPath};
use market_loader_db::catalog::TableDef;
use market_loader_db::csv_source::CsvSource;
use market_loader_db::store::{BulkError, Store};

/// One table and the file that feeds it.
#[derive(Debug, Clone, Copy)]
pub struct IngestJob<'a> {
    pub table: &'a TableDef,
    pub source: &'a Path,
}

/// A way of loading a table from its source file.
pub trait Ingest {
    /// Which path this strategy reports as.
    fn path(&self) -> IngestPath;

    /// Load `job` into `store`, returning the number of rows written.
    ///
    /// On error nothing from this attempt is committed.
    fn ingest(&self, store: &mut dyn Store, job: &IngestJob<'_>) -> Result<u64, BulkError>;
}

/// Store-native bulk copy of the raw file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCopy;

impl Ingest for BulkCopy {
    fn path(&self) -> IngestPath {
        IngestPath::BulkCopy
    }

    fn ingest(&self, store: &mut dyn Store, job: &IngestJob<'_>) -> Result<u64, BulkError> {
        if !store.supports_bulk_copy() {
            return Err(BulkError::Unsupported(format!(
                "{} has no bulk copy mechanism",
                store.backend()
            )));
        }

        // The header names the column list for the copy statement; the store
        // then reads the same header line again and skips it.
        let columns = CsvSource::open(job.source)?.bind(job.table)?;

        let file = File::open(job.source).map_err(Error::from)?;
        let mut data = BufReader::new(file);

        store.bulk_copy(job.table, &columns, &mut data)
    }
}

/// Parameterized insert of every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowInsert;

impl Ingest for RowInsert {
    fn path(&self) -> IngestPath {
        IngestPath::RowInsert
    }

    fn ingest(&self, store: &mut dyn Store, job: &IngestJob<'_>) -> Result<u64, BulkError> {
        let mut source = CsvSource::open(job.source)?;
        let columns = source.bind(job.table)?;

        let mut rows = source.rows();
        let inserted = store.insert_rows(job.table, &columns, &mut rows)?;
        Ok(inserted)
    }
}
