//! CLI end-to-end tests
//!
//! Tests for the market-loader command-line interface. Every command that
//! reaches a store uses the sqlite backend.

mod common;

use assert_cmd::prelude::*;
use common::Dataset;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the market-loader binary, isolated from the caller's
/// connection settings and `.env` file.
#[allow(deprecated)]
fn market_loader_cmd(cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("market-loader").unwrap();
    cmd.current_dir(cwd);
    for var in [
        "PGHOST",
        "PG_HOST",
        "PGPORT",
        "PG_PORT",
        "PGDATABASE",
        "PG_DB",
        "PGUSER",
        "PG_USER",
        "PGPASSWORD",
        "PG_PASSWORD",
        "MARKET_CSV_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("market-loader"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_cli_load_help() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .args(["load", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--on-bulk-failure"));
}

#[test]
fn test_cli_rejects_unknown_mode() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .args(["load", "--mode", "upsert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown load mode 'upsert'"));
}

#[test]
fn test_cli_schema_prints_postgres_ddl() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE SCHEMA IF NOT EXISTS \"marketing\""))
        .stdout(predicate::str::contains(
            "CREATE TABLE IF NOT EXISTS \"marketing\".\"perf_content\"",
        ))
        .stdout(predicate::str::contains("ON DELETE CASCADE"));
}

#[test]
fn test_cli_schema_sqlite_dialect() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .args(["schema", "--dialect", "sqlite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE SCHEMA").not())
        .stdout(predicate::str::contains("\"marketing\".\"campaign\""));
}

#[test]
fn test_cli_plan_reports_missing_files() {
    let mut dataset = Dataset::valid();
    dataset.remove("Content.csv");

    market_loader_cmd(dataset.path())
        .args(["plan", "--csv-dir"])
        .arg(dataset.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Campaign.csv"))
        .stdout(predicate::str::contains("[3 rows]"))
        .stdout(predicate::str::contains("[missing]"))
        .stdout(predicate::str::contains("1 of 21 source files are missing."));
}

#[test]
fn test_cli_plan_uses_env_csv_dir() {
    let dataset = Dataset::valid();
    let cwd = tempdir().unwrap();

    market_loader_cmd(cwd.path())
        .arg("plan")
        .env("MARKET_CSV_DIR", dataset.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All 21 source files are present."));
}

#[test]
fn test_cli_load_into_sqlite() {
    let dataset = Dataset::valid();
    let db = tempdir().unwrap();
    let db_path = db.path().join("market.sqlite");

    market_loader_cmd(db.path())
        .args(["load", "--backend", "sqlite", "--sqlite-path"])
        .arg(&db_path)
        .arg("--csv-dir")
        .arg(dataset.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Loading Campaign.csv -> campaign"))
        .stdout(predicate::str::contains("row-insert ok: 3 rows"))
        .stdout(predicate::str::contains("Loading PERF_CONTENT.csv -> perf_content"))
        .stdout(predicate::str::contains("All done."));

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM performance_daily", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);

    market_loader_cmd(db.path())
        .args(["counts", "--backend", "sqlite", "--sqlite-path"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"performance_daily\s+3").unwrap());
}

#[test]
fn test_cli_load_missing_source_fails() {
    let mut dataset = Dataset::valid();
    dataset.remove("Product.csv");
    let db = tempdir().unwrap();

    market_loader_cmd(db.path())
        .args(["load", "--backend", "sqlite", "--sqlite-path", ":memory:", "--csv-dir"])
        .arg(dataset.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Loading Campaign.csv -> campaign"))
        .stdout(predicate::str::contains("Persona.csv").not())
        .stderr(predicate::str::contains("Source file not found for table product"));
}

#[test]
fn test_cli_rerun_with_skip_populated() {
    let dataset = Dataset::valid();
    let db = tempdir().unwrap();
    let db_path = db.path().join("market.sqlite");

    let run = |mode: &str| {
        market_loader_cmd(db.path())
            .args(["load", "--backend", "sqlite", "--mode", mode, "--sqlite-path"])
            .arg(&db_path)
            .arg("--csv-dir")
            .arg(dataset.path())
            .assert()
    };

    run("append").success();
    run("append")
        .failure()
        .stderr(predicate::str::contains("UNIQUE constraint failed"));
    run("skip-populated")
        .success()
        .stdout(predicate::str::contains("skipped"))
        .stdout(predicate::str::contains("21 skipped"));
}

#[test]
fn test_cli_missing_credentials() {
    let dir = tempdir().unwrap();
    market_loader_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing database settings"))
        .stderr(predicate::str::contains("PGDATABASE/PG_DB"))
        .stderr(predicate::str::contains("PGPASSWORD/PG_PASSWORD"));
}

#[test]
fn test_cli_env_file_credentials_reach_connect() {
    let dir = tempdir().unwrap();
    let env_path = dir.path().join("loader.env");
    std::fs::write(
        &env_path,
        "PG_HOST=localhost\nPG_PORT=1\nPG_DB=marketing\nPG_USER=loader\nPG_PASSWORD=secret\n",
    )
    .unwrap();

    // Nothing listens on port 1; the failure proves the settings resolved.
    market_loader_cmd(dir.path())
        .args(["init", "--env-file"])
        .arg(&env_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("127.0.0.1:1/marketing"))
        .stderr(predicate::str::contains("secret").not());
}
