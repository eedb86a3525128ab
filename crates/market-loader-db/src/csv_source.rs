//! CSV source files.
//!
//! A source file has a header row naming table columns in any order. Fields
//! are handed to the store as text, and every empty field becomes NULL.
//! `COPY ... (FORMAT csv)` only does that for unquoted empty values: a quoted
//! `""` reaches a text column as an empty string on the bulk path but as NULL
//! here. The reader does not report quoting, so the two cannot be told apart.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use market_loader_common::{Error, Result};

use crate::catalog::{Column, TableDef};

/// One data row, in header order.
pub type Row = Vec<Option<String>>;

/// An open CSV file positioned after its header row.
pub struct CsvSource {
    path: PathBuf,
    reader: csv::Reader<File>,
    headers: Vec<String>,
}

impl CsvSource {
    /// Open `path` and read its header row.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, &e))?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            headers,
        })
    }

    /// Header names as they appear in the file.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Map the header onto `table`'s columns, keeping header order.
    ///
    /// Fails on an empty header, an unknown name, or a repeated name.
    pub fn bind(&self, table: &TableDef) -> Result<Vec<&'static Column>> {
        bind_headers(&self.headers, table)
    }

    /// Stream the remaining data rows.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<Row>> + '_ {
        let path = self.path.clone();
        self.reader.records().map(move |record| {
            record
                .map(|r| to_row(&r))
                .map_err(|e| csv_error(&path, &e))
        })
    }
}

/// Check a header row against `table` and return its columns in header order.
pub fn bind_headers(headers: &[String], table: &TableDef) -> Result<Vec<&'static Column>> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(Error::header(table.name, "header row is empty"));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for name in headers {
        if !seen.insert(name.as_str()) {
            return Err(Error::header(
                table.name,
                format!("column \"{name}\" appears more than once"),
            ));
        }

        let column = table.column(name).ok_or_else(|| {
            Error::header(
                table.name,
                format!(
                    "unknown column \"{name}\" (expected one of: {})",
                    table.column_names().join(", ")
                ),
            )
        })?;
        columns.push(column);
    }

    Ok(columns)
}

/// Count data rows in a CSV file, header excluded.
pub fn count_rows(path: &Path) -> Result<u64> {
    let mut source = CsvSource::open(path)?;
    let mut count = 0;
    for row in source.rows() {
        row?;
        count += 1;
    }
    Ok(count)
}

fn to_row(record: &StringRecord) -> Row {
    record
        .iter()
        .map(|field| {
            if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            }
        })
        .collect()
}

fn csv_error(path: &Path, err: &csv::Error) -> Error {
    Error::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
