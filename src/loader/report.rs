use market_loader_common::IngestPath;
use std::path::PathBuf;

/// What happened to one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rows were written through `path`.
    Loaded { path: IngestPath, rows: u64 },
    /// The table already held `existing` rows and was left alone.
    Skipped { existing: u64 },
}

/// Result of loading a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: &'static str,
    pub source: PathBuf,
    pub outcome: Outcome,
    /// Why the bulk copy was not used, when the table fell back.
    pub fallback_reason: Option<String>,
}

impl TableReport {
    /// Path that loaded the table, if it was loaded.
    pub fn path(&self) -> Option<IngestPath> {
        match self.outcome {
            Outcome::Loaded { path, .. } => Some(path),
            Outcome::Skipped { .. } => None,
        }
    }

    /// Rows written by this run.
    pub fn rows(&self) -> u64 {
        match self.outcome {
            Outcome::Loaded { rows, .. } => rows,
            Outcome::Skipped { .. } => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }
}

/// Per-table outcomes of a run, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(TableReport::rows).sum()
    }

    /// Tables loaded through `path` and the rows they received.
    pub fn via(&self, path: IngestPath) -> (usize, u64) {
        self.tables
            .iter()
            .filter(|t| t.path() == Some(path))
            .fold((0, 0), |(tables, rows), t| (tables + 1, rows + t.rows()))
    }

    pub fn skipped(&self) -> usize {
        self.tables.iter().filter(|t| t.is_skipped()).count()
    }

    pub fn get(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }

    /// One-line summary for the end of a run.
    pub fn summary(&self) -> String {
        let (bulk_tables, bulk_rows) = self.via(IngestPath::BulkCopy);
        let (insert_tables, insert_rows) = self.via(IngestPath::RowInsert);

        let mut summary = format!(
            "{} rows into {} tables ({}: {} tables, {} rows; {}: {} tables, {} rows)",
            self.total_rows(),
            self.tables.len() - self.skipped(),
            IngestPath::BulkCopy,
            bulk_tables,
            bulk_rows,
            IngestPath::RowInsert,
            insert_tables,
            insert_rows,
        );
        if self.skipped() > 0 {
            summary.push_str(&format!(", {} skipped", self.skipped()));
        }
        summary
    }
}
