//! Table catalog for the marketing schema.
//!
//! [`TABLES`] is the single source of truth for table layout and load order:
//! the schema initializer renders its DDL from it, the loader walks it in
//! order, and CSV headers are checked against its column lists. Parents come
//! before every table that references them; [`validate_order`] enforces that.

use std::collections::HashSet;

use market_loader_common::{Error, Result};

/// Column type as declared in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Text,
    Integer,
    Numeric,
    Timestamp,
}

/// A single table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub not_null: bool,
}

impl Column {
    /// Nullable column.
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
        }
    }

    /// `NOT NULL` column.
    pub const fn required(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            not_null: true,
        }
    }

    /// Nullable text column.
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, SqlType::Text)
    }
}

/// Foreign key from one column to a column of an earlier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
    pub references_column: &'static str,
    pub on_delete_cascade: bool,
}

/// Role a table plays in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Named entity referenced by other tables.
    Dimension,
    /// Daily performance facts.
    Fact,
    /// Many-to-many link between two dimensions.
    Association,
    /// Link from a performance fact to one dimension.
    FactLink,
}

/// Descriptor for one table and the CSV file that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub source_file: &'static str,
    pub kind: TableKind,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableDef {
    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Whether `name` is part of the primary key.
    pub fn is_key_column(&self, name: &str) -> bool {
        self.primary_key.contains(&name)
    }

    /// Names of the tables this table references.
    pub fn parents(&self) -> Vec<&'static str> {
        let mut parents: Vec<&'static str> = Vec::new();
        for fk in self.foreign_keys {
            if !parents.contains(&fk.references) {
                parents.push(fk.references);
            }
        }
        parents
    }
}

// Junction tables all have the same shape: two text key columns forming the
// primary key, each referencing a parent.
macro_rules! association {
    ($name:literal, $file:literal, ($a:literal -> $pa:literal), ($b:literal -> $pb:literal)) => {
        TableDef {
            name: $name,
            source_file: $file,
            kind: TableKind::Association,
            columns: &[Column::text($a), Column::text($b)],
            primary_key: &[$a, $b],
            foreign_keys: &[
                ForeignKey {
                    column: $a,
                    references: $pa,
                    references_column: $a,
                    on_delete_cascade: false,
                },
                ForeignKey {
                    column: $b,
                    references: $pb,
                    references_column: $b,
                    on_delete_cascade: false,
                },
            ],
        }
    };
}

macro_rules! fact_link {
    ($name:literal, $file:literal, $key:literal -> $parent:literal) => {
        TableDef {
            name: $name,
            source_file: $file,
            kind: TableKind::FactLink,
            columns: &[Column::text("perf_id"), Column::text($key)],
            primary_key: &["perf_id", $key],
            foreign_keys: &[
                ForeignKey {
                    column: "perf_id",
                    references: "performance_daily",
                    references_column: "perf_id",
                    on_delete_cascade: true,
                },
                ForeignKey {
                    column: $key,
                    references: $parent,
                    references_column: $key,
                    on_delete_cascade: false,
                },
            ],
        }
    };
}

// =============================================================================
// Dimension and fact tables (no foreign keys)
// =============================================================================

pub const CAMPAIGN: TableDef = TableDef {
    name: "campaign",
    source_file: "Campaign.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("campaign_id"),
        Column::required("campaign_name", SqlType::Text),
        Column::text("objective"),
        Column::text("kind"),
        Column::text("status"),
        Column::new("start_date", SqlType::Timestamp),
        Column::new("end_date", SqlType::Timestamp),
        Column::new("budget", SqlType::Numeric),
    ],
    primary_key: &["campaign_id"],
    foreign_keys: &[],
};

pub const PRODUCT: TableDef = TableDef {
    name: "product",
    source_file: "Product.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("sku"),
        Column::required("product_name", SqlType::Text),
        Column::text("category"),
        Column::text("tier"),
    ],
    primary_key: &["sku"],
    foreign_keys: &[],
};

pub const PERSONA: TableDef = TableDef {
    name: "persona",
    source_file: "Persona.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("persona_id"),
        Column::text("segment"),
        Column::text("industry"),
        Column::text("region"),
        Column::text("role"),
    ],
    primary_key: &["persona_id"],
    foreign_keys: &[],
};

pub const CHANNEL: TableDef = TableDef {
    name: "channel",
    source_file: "Channel.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("channel_id"),
        Column::text("kind"),
        Column::text("cost_model"),
    ],
    primary_key: &["channel_id"],
    foreign_keys: &[],
};

pub const MARKET: TableDef = TableDef {
    name: "market",
    source_file: "Market.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("market_id"),
        Column::text("region"),
        Column::text("competitors"),
        Column::new("trend_index", SqlType::Numeric),
    ],
    primary_key: &["market_id"],
    foreign_keys: &[],
};

pub const CONTENT_ASSET: TableDef = TableDef {
    name: "content_asset",
    source_file: "Content.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("content_id"),
        Column::text("content_title"),
        Column::text("content_kind"),
        Column::text("topic"),
        Column::text("url"),
    ],
    primary_key: &["content_id"],
    foreign_keys: &[],
};

pub const DATE_DIM: TableDef = TableDef {
    name: "date_dim",
    source_file: "Date.csv",
    kind: TableKind::Dimension,
    columns: &[
        Column::text("date_key"),
        Column::required("date_value", SqlType::Timestamp),
        Column::required("year", SqlType::Integer),
        Column::required("month", SqlType::Integer),
        Column::required("day", SqlType::Integer),
        Column::new("week", SqlType::Integer),
        Column::new("quarter", SqlType::Integer),
    ],
    primary_key: &["date_key"],
    foreign_keys: &[],
};

pub const PERFORMANCE_DAILY: TableDef = TableDef {
    name: "performance_daily",
    source_file: "PerformanceDaily.csv",
    kind: TableKind::Fact,
    columns: &[
        Column::text("perf_id"),
        Column::required("as_of", SqlType::Timestamp),
        Column::required("currency", SqlType::Text),
        Column::new("impressions", SqlType::Integer),
        Column::new("clicks", SqlType::Integer),
        Column::new("spend", SqlType::Numeric),
        Column::new("leads", SqlType::Integer),
        Column::new("opps", SqlType::Integer),
        Column::new("customers", SqlType::Integer),
        Column::new("revenue", SqlType::Numeric),
        Column::new("ctr", SqlType::Numeric),
        Column::new("cpl", SqlType::Numeric),
        Column::new("cac", SqlType::Numeric),
        Column::new("roas", SqlType::Numeric),
    ],
    primary_key: &["perf_id"],
    foreign_keys: &[],
};

// =============================================================================
// Association tables
// =============================================================================

pub const PROMOTES: TableDef = association!(
    "promotes",
    "PROMOTES.csv",
    ("campaign_id" -> "campaign"),
    ("sku" -> "product")
);

pub const TARGETS: TableDef = association!(
    "targets",
    "TARGETS.csv",
    ("campaign_id" -> "campaign"),
    ("persona_id" -> "persona")
);

pub const RUNS_ON: TableDef = association!(
    "runs_on",
    "RUNS_ON.csv",
    ("campaign_id" -> "campaign"),
    ("channel_id" -> "channel")
);

pub const SUPPORTED_BY: TableDef = association!(
    "supported_by",
    "SUPPORTED_BY.csv",
    ("campaign_id" -> "campaign"),
    ("content_id" -> "content_asset")
);

pub const IN_MARKET: TableDef = association!(
    "in_market",
    "IN_MARKET.csv",
    ("sku" -> "product"),
    ("market_id" -> "market")
);

pub const PERSONA_IN_MARKET: TableDef = association!(
    "persona_in_market",
    "PERSONA_IN_MARKET.csv",
    ("persona_id" -> "persona"),
    ("market_id" -> "market")
);

// =============================================================================
// Fact-linkage tables
// =============================================================================

pub const PERF_DATE: TableDef =
    fact_link!("perf_date", "PERF_DATE.csv", "date_key" -> "date_dim");
pub const PERF_CAMPAIGN: TableDef =
    fact_link!("perf_campaign", "PERF_CAMPAIGN.csv", "campaign_id" -> "campaign");
pub const PERF_PRODUCT: TableDef =
    fact_link!("perf_product", "PERF_PRODUCT.csv", "sku" -> "product");
pub const PERF_PERSONA: TableDef =
    fact_link!("perf_persona", "PERF_PERSONA.csv", "persona_id" -> "persona");
pub const PERF_CHANNEL: TableDef =
    fact_link!("perf_channel", "PERF_CHANNEL.csv", "channel_id" -> "channel");
pub const PERF_MARKET: TableDef =
    fact_link!("perf_market", "PERF_MARKET.csv", "market_id" -> "market");
pub const PERF_CONTENT: TableDef =
    fact_link!("perf_content", "PERF_CONTENT.csv", "content_id" -> "content_asset");

/// All tables in creation and load order.
pub static TABLES: &[TableDef] = &[
    CAMPAIGN,
    PRODUCT,
    PERSONA,
    CHANNEL,
    MARKET,
    CONTENT_ASSET,
    DATE_DIM,
    PERFORMANCE_DAILY,
    PROMOTES,
    TARGETS,
    RUNS_ON,
    SUPPORTED_BY,
    IN_MARKET,
    PERSONA_IN_MARKET,
    PERF_DATE,
    PERF_CAMPAIGN,
    PERF_PRODUCT,
    PERF_PERSONA,
    PERF_CHANNEL,
    PERF_MARKET,
    PERF_CONTENT,
];

/// Find a catalog table by name.
pub fn find(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

/// Check that `tables` can be created and loaded front to back.
///
/// Every foreign key must reference a table that appears strictly earlier,
/// every key column must be a declared column, and names must be unique.
pub fn validate_order(tables: &[TableDef]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();

    for table in tables {
        if seen.contains(table.name) {
            return Err(Error::catalog(format!(
                "table {} is declared more than once",
                table.name
            )));
        }

        if table.primary_key.is_empty() {
            return Err(Error::catalog(format!(
                "table {} has no primary key",
                table.name
            )));
        }

        for key in table.primary_key {
            if table.column(key).is_none() {
                return Err(Error::catalog(format!(
                    "primary key column {}.{} is not declared",
                    table.name, key
                )));
            }
        }

        for parent in table.parents() {
            if !seen.contains(parent) {
                return Err(Error::catalog(format!(
                    "table {} references {} which is not loaded before it",
                    table.name, parent
                )));
            }
        }

        for fk in table.foreign_keys {
            if table.column(fk.column).is_none() {
                return Err(Error::catalog(format!(
                    "foreign key column {}.{} is not declared",
                    table.name, fk.column
                )));
            }

            let parent = tables
                .iter()
                .find(|t| t.name == fk.references)
                .and_then(|t| t.column(fk.references_column));
            if parent.is_none() {
                return Err(Error::catalog(format!(
                    "{}.{} references missing column {}.{}",
                    table.name, fk.column, fk.references, fk.references_column
                )));
            }
        }

        seen.insert(table.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_is_valid() {
        validate_order(TABLES).unwrap();
        assert_eq!(TABLES.len(), 21);
    }

    #[test]
    fn test_catalog_groups_in_order() {
        let kinds: Vec<TableKind> = TABLES.iter().map(|t| t.kind).collect();

        assert!(kinds[..7].iter().all(|k| *k == TableKind::Dimension));
        assert_eq!(kinds[7], TableKind::Fact);
        assert!(kinds[8..14].iter().all(|k| *k == TableKind::Association));
        assert!(kinds[14..].iter().all(|k| *k == TableKind::FactLink));
    }

    #[test]
    fn test_source_files() {
        assert_eq!(find("content_asset").unwrap().source_file, "Content.csv");
        assert_eq!(find("date_dim").unwrap().source_file, "Date.csv");
        assert_eq!(
            find("persona_in_market").unwrap().source_file,
            "PERSONA_IN_MARKET.csv"
        );
        assert!(find("campaigns").is_none());
    }

    #[test]
    fn test_fact_links_cascade_from_performance() {
        for table in TABLES.iter().filter(|t| t.kind == TableKind::FactLink) {
            let perf = &table.foreign_keys[0];
            assert_eq!(perf.references, "performance_daily");
            assert!(perf.on_delete_cascade, "{} should cascade", table.name);
            assert!(!table.foreign_keys[1].on_delete_cascade);
            assert_eq!(table.primary_key[0], "perf_id");
        }
    }

    #[test]
    fn test_parents() {
        assert_eq!(PROMOTES.parents(), vec!["campaign", "product"]);
        assert_eq!(PERF_DATE.parents(), vec!["performance_daily", "date_dim"]);
        assert!(CAMPAIGN.parents().is_empty());
    }

    #[test]
    fn test_key_columns() {
        assert!(PERF_MARKET.is_key_column("perf_id"));
        assert!(PERF_MARKET.is_key_column("market_id"));
        assert!(!CAMPAIGN.is_key_column("campaign_name"));
    }

    #[test]
    fn test_child_before_parent_rejected() {
        let tables = [PROMOTES, CAMPAIGN, PRODUCT];
        let err = validate_order(&tables).unwrap_err();
        assert!(err.to_string().contains("promotes references campaign"));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let tables = [CAMPAIGN, CAMPAIGN];
        let err = validate_order(&tables).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_undeclared_key_column_rejected() {
        const BROKEN: TableDef = TableDef {
            name: "broken",
            source_file: "BROKEN.csv",
            kind: TableKind::Association,
            columns: &[Column::text("campaign_id")],
            primary_key: &["campaign_id", "sku"],
            foreign_keys: &[],
        };

        let err = validate_order(&[CAMPAIGN, BROKEN]).unwrap_err();
        assert!(err.to_string().contains("broken.sku"));
    }
}
