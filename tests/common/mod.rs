//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{count, run_stage, TestWorkspace, MATCHED_PLAYS};
//! use songplays_etl::Stage;
//!
//! #[test]
//! fn test_full_run() {
//!     let workspace = TestWorkspace::new().unwrap();
//!     let (warehouse, _) = run_stage(&workspace, Stage::Full).unwrap();
//!     assert_eq!(count(&warehouse, "songplays"), MATCHED_PLAYS as i64);
//! }
//! ```

mod constants;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    catalog_entry, default_catalog, default_events, page_event, play_event, TestWorkspace,
};

use rusqlite::types::FromSql;
use songplays_etl::{Pipeline, Result, RunReport, SqliteWarehouse, Stage};

/// Opens the workspace's warehouse and runs one stage of the pipeline on it.
///
/// The warehouse is returned on success so tests can inspect its tables.
#[allow(dead_code)]
pub fn run_stage(
    workspace: &TestWorkspace,
    stage: Stage,
) -> Result<(SqliteWarehouse, RunReport)> {
    run_stage_with_max_errors(workspace, stage, 0)
}

#[allow(dead_code)]
pub fn run_stage_with_max_errors(
    workspace: &TestWorkspace,
    stage: Stage,
    max_errors: u32,
) -> Result<(SqliteWarehouse, RunReport)> {
    let config = workspace
        .config_with_max_errors(max_errors)
        .expect("fixture config resolves");
    let mut warehouse = SqliteWarehouse::open(&workspace.warehouse_path)?;
    let report = Pipeline::new(&config).run(&mut warehouse, stage)?;
    Ok((warehouse, report))
}

#[allow(dead_code)]
pub fn count(warehouse: &SqliteWarehouse, table: &str) -> i64 {
    warehouse
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}

/// Runs `sql` and collects the first column of every row.
#[allow(dead_code)]
pub fn column<T: FromSql>(warehouse: &SqliteWarehouse, sql: &str) -> Vec<T> {
    let mut statement = warehouse.connection().prepare(sql).unwrap();
    let rows = statement
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<T>>>()
        .unwrap();
    rows
}
