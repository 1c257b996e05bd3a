//! Songplays ETL Library
//!
//! Loads raw listening-activity logs and a song catalog into staging tables,
//! then reshapes them into a star schema for analytics queries.

pub mod config;
pub mod dialect;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod statements;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{ConfigError, PipelineConfig, WarehouseSettings};
pub use dialect::Dialect;
pub use error::{EtlError, LoadError, Result};
pub use pipeline::{Pipeline, RunReport, Stage};
pub use statements::{LoadStatement, Statement, Transform};
pub use warehouse::{connect, RedshiftWarehouse, SqliteWarehouse, Warehouse};
