//! SQL rendering for each supported dialect.
//!
//! Identifiers are always double-quoted. Both dialects accept that form, and
//! it keeps column names such as `role` or `year` from colliding with
//! keywords.

use std::fmt::Write as _;

use market_loader_common::Backend;

use crate::catalog::{Column, SqlType, TableDef};

/// SQL dialect of a store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl From<Backend> for Dialect {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Postgres => Self::Postgres,
            Backend::Sqlite => Self::Sqlite,
        }
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

impl Dialect {
    /// Declared type name of a column type.
    pub fn type_name(self, sql_type: SqlType) -> &'static str {
        match (self, sql_type) {
            (Self::Postgres, SqlType::Text) => "text",
            (Self::Postgres, SqlType::Integer) => "integer",
            (Self::Postgres, SqlType::Numeric) => "numeric",
            (Self::Postgres, SqlType::Timestamp) => "timestamp",
            (Self::Sqlite, SqlType::Text) => "TEXT",
            (Self::Sqlite, SqlType::Integer) => "INTEGER",
            (Self::Sqlite, SqlType::Numeric) => "NUMERIC",
            (Self::Sqlite, SqlType::Timestamp) => "TEXT",
        }
    }

    /// Statement making `schema` the session's lookup namespace.
    ///
    /// SQLite has no search path; its namespace is the attached database and
    /// every statement uses qualified names.
    pub fn search_path(self, schema: &str) -> Option<String> {
        match self {
            Self::Postgres => Some(format!("SET search_path TO {}, public", quote_ident(schema))),
            Self::Sqlite => None,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for one catalog table.
    pub fn create_table(self, schema: &str, table: &TableDef) -> String {
        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let mut line = format!("  {} {}", quote_ident(c.name), self.type_name(c.sql_type));
                if c.not_null || table.is_key_column(c.name) {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();

        let pk: Vec<String> = table.primary_key.iter().map(|k| quote_ident(k)).collect();
        lines.push(format!("  PRIMARY KEY ({})", pk.join(", ")));

        for fk in table.foreign_keys {
            let mut line = format!(
                "  FOREIGN KEY ({}) REFERENCES {}({})",
                quote_ident(fk.column),
                self.reference(schema, fk.references),
                quote_ident(fk.references_column)
            );
            if fk.on_delete_cascade {
                line.push_str(" ON DELETE CASCADE");
            }
            lines.push(line);
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            qualified(schema, table.name),
            lines.join(",\n")
        )
    }

    // SQLite resolves foreign keys inside the child's own database and
    // rejects qualified parent names.
    fn reference(self, schema: &str, table: &str) -> String {
        match self {
            Self::Postgres => qualified(schema, table),
            Self::Sqlite => quote_ident(table),
        }
    }

    /// Full bootstrap script: namespace, search path, then every table in
    /// catalog order.
    pub fn schema_script(self, schema: &str, tables: &[TableDef]) -> String {
        let mut script = String::new();

        if self == Self::Postgres {
            let _ = writeln!(script, "CREATE SCHEMA IF NOT EXISTS {};", quote_ident(schema));
        }
        if let Some(set) = self.search_path(schema) {
            let _ = writeln!(script, "{set};");
        }

        for table in tables {
            script.push('\n');
            script.push_str(&self.create_table(schema, table));
            script.push('\n');
        }

        script
    }

    /// Parameterized single-row insert for the given columns, in order.
    ///
    /// Values are bound as text. PostgreSQL casts each one to the column
    /// type; SQLite applies column affinity.
    pub fn insert_row(self, schema: &str, table: &str, columns: &[&Column]) -> String {
        let names: Vec<String> = columns.iter().map(|c| quote_ident(c.name)).collect();
        let values: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| match self {
                Self::Postgres if c.sql_type == SqlType::Text => format!("${}::text", i + 1),
                Self::Postgres => format!(
                    "CAST(${}::text AS {})",
                    i + 1,
                    self.type_name(c.sql_type)
                ),
                Self::Sqlite => format!("?{}", i + 1),
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified(schema, table),
            names.join(", "),
            values.join(", ")
        )
    }

    /// `COPY ... FROM STDIN` reading CSV with a header row.
    pub fn copy_from_stdin(schema: &str, table: &str, columns: &[&Column]) -> String {
        let names: Vec<String> = columns.iter().map(|c| quote_ident(c.name)).collect();
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, HEADER true)",
            qualified(schema, table),
            names.join(", ")
        )
    }
}
