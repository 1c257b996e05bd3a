//! Error taxonomy for a pipeline run.
//!
//! Every variant aborts the remaining statement sequence; nothing is retried.

use crate::config::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Unreachable warehouse or storage source.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Drop or create of a table failed, or an existing table has the wrong shape.
    #[error("Schema error on {table}: {message}")]
    Schema {
        table: &'static str,
        message: String,
    },

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Referenced table missing, type coercion failure, or any other SQL
    /// error raised while populating a warehouse table.
    #[error("Transform {transform} failed: {message}")]
    Transform { transform: String, message: String },
}

/// Errors raised while bulk loading a staging table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "{table}: {rejected} record(s) rejected, tolerance is {max_errors}. First rejection: {first}"
    )]
    Rejected {
        table: &'static str,
        rejected: usize,
        max_errors: u32,
        first: String,
    },

    #[error("{table}: access denied reading {uri}: {reason}")]
    AccessDenied {
        table: &'static str,
        uri: String,
        reason: String,
    },

    #[error("Invalid format spec {uri}: {reason}")]
    FormatSpec { uri: String, reason: String },

    #[error("{table}: {message}")]
    Sql {
        table: &'static str,
        message: String,
    },
}
