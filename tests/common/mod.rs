//! Shared test harness for integration tests.
//!
//! Provides [`Dataset`], a directory of small but consistent source files for
//! every catalog table, and [`sqlite_store`], an in-memory store with the
//! schema already created.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use market_loader_db::catalog::TABLES;
use market_loader_db::csv_source::count_rows;
use market_loader_db::schema::init_schema;
use market_loader_db::store::SqliteStore;
use tempfile::TempDir;

/// Source files keyed by file name, written into a temporary directory.
pub struct Dataset {
    dir: TempDir,
    files: HashMap<&'static str, String>,
}

impl Dataset {
    /// A complete, referentially valid set of source files.
    pub fn valid() -> Self {
        let mut files = HashMap::new();

        files.insert(
            "Campaign.csv",
            "campaign_id,campaign_name,objective,kind,status,start_date,end_date,budget\n\
             CMP-1,Spring Launch,awareness,paid,active,2024-03-01,2024-05-31,25000\n\
             CMP-2,Summer Retarget,conversion,paid,planned,2024-06-01,,12000.50\n\
             CMP-3,\"Webinar, Q3\",leads,owned,draft,,,\n"
                .to_string(),
        );
        files.insert(
            "Product.csv",
            "sku,product_name,category,tier\n\
             SKU-1,Analytics Suite,software,enterprise\n\
             SKU-2,Insights Lite,software,starter\n"
                .to_string(),
        );
        files.insert(
            "Persona.csv",
            "persona_id,segment,industry,region,role\n\
             PER-1,mid-market,retail,EMEA,cmo\n\
             PER-2,enterprise,finance,NA,analyst\n"
                .to_string(),
        );
        files.insert(
            "Channel.csv",
            "channel_id,kind,cost_model\n\
             CH-1,search,cpc\n\
             CH-2,social,cpm\n\
             CH-3,email,\n"
                .to_string(),
        );
        files.insert(
            "Market.csv",
            "market_id,region,competitors,trend_index\n\
             MKT-1,EMEA,\"Acme; Globex\",1.15\n\
             MKT-2,NA,Initech,0.92\n"
                .to_string(),
        );
        files.insert(
            "Content.csv",
            "content_id,content_title,content_kind,topic,url\n\
             CNT-1,Buyer Guide,ebook,analytics,https://example.com/guide\n\
             CNT-2,Launch Video,video,product,https://example.com/video\n"
                .to_string(),
        );
        files.insert(
            "Date.csv",
            "date_key,date_value,year,month,day,week,quarter\n\
             20240301,2024-03-01,2024,3,1,9,1\n\
             20240302,2024-03-02,2024,3,2,9,1\n"
                .to_string(),
        );
        files.insert(
            "PerformanceDaily.csv",
            "perf_id,as_of,currency,impressions,clicks,spend,leads,opps,customers,revenue,ctr,cpl,cac,roas\n\
             PF-1,2024-03-01,USD,12000,340,512.40,22,5,2,8400,0.0283,23.29,256.20,16.39\n\
             PF-2,2024-03-02,USD,9800,260,430.10,17,3,1,3900,0.0265,25.30,430.10,9.07\n\
             PF-3,2024-03-02,EUR,4100,90,120.00,6,1,0,0,0.0220,20.00,,\n"
                .to_string(),
        );

        let links: &[(&'static str, &str, &[(&str, &str)])] = &[
            (
                "PROMOTES.csv",
                "campaign_id,sku",
                &[("CMP-1", "SKU-1"), ("CMP-2", "SKU-1"), ("CMP-2", "SKU-2")],
            ),
            (
                "TARGETS.csv",
                "campaign_id,persona_id",
                &[("CMP-1", "PER-1"), ("CMP-3", "PER-2")],
            ),
            (
                "RUNS_ON.csv",
                "campaign_id,channel_id",
                &[("CMP-1", "CH-1"), ("CMP-1", "CH-2"), ("CMP-2", "CH-3")],
            ),
            (
                "SUPPORTED_BY.csv",
                "campaign_id,content_id",
                &[("CMP-1", "CNT-2"), ("CMP-3", "CNT-1")],
            ),
            (
                "IN_MARKET.csv",
                "sku,market_id",
                &[("SKU-1", "MKT-1"), ("SKU-1", "MKT-2"), ("SKU-2", "MKT-2")],
            ),
            (
                "PERSONA_IN_MARKET.csv",
                "persona_id,market_id",
                &[("PER-1", "MKT-1"), ("PER-2", "MKT-2")],
            ),
            (
                "PERF_DATE.csv",
                "perf_id,date_key",
                &[("PF-1", "20240301"), ("PF-2", "20240302"), ("PF-3", "20240302")],
            ),
            (
                "PERF_CAMPAIGN.csv",
                "perf_id,campaign_id",
                &[("PF-1", "CMP-1"), ("PF-2", "CMP-1"), ("PF-3", "CMP-2")],
            ),
            (
                "PERF_PRODUCT.csv",
                "perf_id,sku",
                &[("PF-1", "SKU-1"), ("PF-3", "SKU-2")],
            ),
            (
                "PERF_PERSONA.csv",
                "perf_id,persona_id",
                &[("PF-1", "PER-1")],
            ),
            (
                "PERF_CHANNEL.csv",
                "perf_id,channel_id",
                &[("PF-1", "CH-1"), ("PF-2", "CH-2"), ("PF-3", "CH-3")],
            ),
            (
                "PERF_MARKET.csv",
                "perf_id,market_id",
                &[("PF-1", "MKT-1"), ("PF-2", "MKT-2")],
            ),
            (
                "PERF_CONTENT.csv",
                "perf_id,content_id",
                &[("PF-2", "CNT-2")],
            ),
        ];
        for (file, header, rows) in links {
            files.insert(*file, pairs(header, rows));
        }

        let dataset = Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            files,
        };
        dataset.write_all();
        dataset
    }

    /// Directory holding the files.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Replace one file's contents on disk.
    pub fn set(&mut self, name: &'static str, body: &str) {
        self.files.insert(name, body.to_string());
        std::fs::write(self.file(name), body).expect("failed to write fixture");
    }

    pub fn remove(&mut self, name: &'static str) {
        self.files.remove(name);
        std::fs::remove_file(self.file(name)).expect("failed to remove fixture");
    }

    /// Data rows in a file, header excluded.
    pub fn expected_rows(&self, name: &str) -> u64 {
        count_rows(&self.file(name)).expect("fixture should parse")
    }

    fn write_all(&self) {
        for table in TABLES {
            let body = self
                .files
                .get(table.source_file)
                .unwrap_or_else(|| panic!("no fixture for {}", table.source_file));
            std::fs::write(self.file(table.source_file), body).expect("failed to write fixture");
        }
    }
}

fn pairs(header: &str, rows: &[(&str, &str)]) -> String {
    let mut body = format!("{header}\n");
    for (a, b) in rows {
        body.push_str(&format!("{a},{b}\n"));
    }
    body
}

/// In-memory SQLite store with every catalog table created.
pub fn sqlite_store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory("marketing").expect("failed to open sqlite");
    init_schema(&mut store, TABLES).expect("failed to create schema");
    store
}
