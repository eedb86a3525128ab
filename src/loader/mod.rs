//! Ordered table loader.
//!
//! Tables are loaded one at a time in catalog order. Each table gets a bulk
//! copy attempt when the store has one, and falls back to row inserts when
//! that attempt fails. A table's rows are committed before the next table
//! starts; the first fatal error ends the run.

mod report;
pub mod strategy;

pub use report::{Outcome, RunReport, TableReport};

use std::path::{Path, PathBuf};

use market_loader_common::{BulkFailurePolicy, Error, LoadMode, Result};
use market_loader_db::catalog::{self, TableDef};
use market_loader_db::store::Store;
use tracing::{debug, info, warn};

use self::strategy::{BulkCopy, Ingest, IngestJob, RowInsert};

/// Progress notifications emitted while a run is in flight.
#[derive(Debug)]
pub enum LoadProgress<'a> {
    /// The source file exists and the table is about to be loaded.
    Started { table: &'a TableDef, source: &'a Path },
    /// The bulk copy failed and row inserts are next.
    FallingBack { table: &'a TableDef, reason: &'a str },
    /// The table is done.
    Finished(&'a TableReport),
}

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(&LoadProgress<'_>) + Send + Sync>;

/// Knobs for a load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub csv_dir: PathBuf,
    pub mode: LoadMode,
    pub on_bulk_failure: BulkFailurePolicy,
}

impl LoadSettings {
    pub fn new(csv_dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_dir: csv_dir.into(),
            mode: LoadMode::default(),
            on_bulk_failure: BulkFailurePolicy::default(),
        }
    }
}

/// Loads catalog tables into one store session.
pub struct Loader<'a> {
    store: &'a mut dyn Store,
    settings: LoadSettings,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a mut dyn Store, settings: LoadSettings) -> Self {
        Self {
            store,
            settings,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, progress: &LoadProgress<'_>) {
        if let Some(ref cb) = self.progress_callback {
            cb(progress);
        }
    }

    /// Load every table in `tables`, in order.
    ///
    /// The order is validated against the declared foreign keys before the
    /// store is touched. In [`LoadMode::Truncate`] every table is emptied in
    /// one transaction first.
    pub fn run(&mut self, tables: &[TableDef]) -> Result<RunReport> {
        catalog::validate_order(tables)?;

        info!(
            tables = tables.len(),
            csv_dir = %self.settings.csv_dir.display(),
            mode = %self.settings.mode,
            on_bulk_failure = %self.settings.on_bulk_failure,
            "starting load"
        );

        if self.settings.mode == LoadMode::Truncate {
            self.store.truncate(tables)?;
            info!(tables = tables.len(), "emptied tables before reload");
        }

        let mut report = RunReport::default();
        for table in tables {
            report.tables.push(self.load_table(table)?);
        }

        info!(
            rows = report.total_rows(),
            skipped = report.skipped(),
            "load complete"
        );

        Ok(report)
    }

    /// Load a single table from its source file.
    pub fn load_table(&mut self, table: &TableDef) -> Result<TableReport> {
        let source = self.settings.csv_dir.join(table.source_file);
        if !source.is_file() {
            return Err(Error::source_missing(table.name, source));
        }

        self.report_progress(&LoadProgress::Started {
            table,
            source: &source,
        });

        if self.settings.mode == LoadMode::SkipPopulated {
            let existing = self.store.row_count(table)?;
            if existing > 0 {
                info!(table = table.name, existing, "table already populated, skipping");
                return Ok(self.finish(TableReport {
                    table: table.name,
                    source,
                    outcome: Outcome::Skipped { existing },
                    fallback_reason: None,
                }));
            }
        }

        let job = IngestJob {
            table,
            source: &source,
        };

        let fallback_reason = match self.try_bulk(&job) {
            Ok(rows) => {
                return Ok(self.finish(TableReport {
                    table: table.name,
                    source: source.clone(),
                    outcome: Outcome::Loaded {
                        path: BulkCopy.path(),
                        rows,
                    },
                    fallback_reason: None,
                }))
            }
            Err(reason) => reason?,
        };

        self.report_progress(&LoadProgress::FallingBack {
            table,
            reason: &fallback_reason,
        });

        let strategy = RowInsert;
        let rows = strategy
            .ingest(&mut *self.store, &job)
            .map_err(|e| Error::load(table.name, strategy.path(), e))?;
        info!(table = table.name, rows, path = %strategy.path(), "table loaded");

        Ok(self.finish(TableReport {
            table: table.name,
            source,
            outcome: Outcome::Loaded {
                path: strategy.path(),
                rows,
            },
            fallback_reason: Some(fallback_reason),
        }))
    }

    // Ok(rows) when the bulk copy loaded the table, Err(Ok(reason)) when the
    // loader should fall back, Err(Err(_)) when the failure is fatal.
    fn try_bulk(&mut self, job: &IngestJob<'_>) -> std::result::Result<u64, Result<String>> {
        let table = job.table.name;

        if !self.store.supports_bulk_copy() {
            let reason = format!("{} has no bulk copy mechanism", self.store.backend());
            debug!(table, %reason, "skipping bulk copy");
            return Err(Ok(reason));
        }

        let strategy = BulkCopy;
        match strategy.ingest(&mut *self.store, job) {
            Ok(rows) => {
                info!(table, rows, path = %strategy.path(), "table loaded");
                Ok(rows)
            }
            Err(err) => {
                let unsupported = err.is_unsupported();
                warn!(table, unsupported, error = %err, "bulk copy failed");

                if self.settings.on_bulk_failure == BulkFailurePolicy::UnsupportedOnly
                    && !unsupported
                {
                    return Err(Err(Error::load(table, strategy.path(), err)));
                }
                Err(Ok(err.to_string()))
            }
        }
    }

    fn finish(&self, report: TableReport) -> TableReport {
        self.report_progress(&LoadProgress::Finished(&report));
        report
    }
}
