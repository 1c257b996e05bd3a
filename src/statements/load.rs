//! Bulk-load statements filling the staging tables from object storage.

use crate::config::PipelineConfig;
use crate::dialect::{Dialect, UnquotableLiteral};
use crate::schema::{Table, STAGING_EVENTS_TABLE, STAGING_SONGS_TABLE};

/// How JSON records are mapped onto the target table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Each column takes the value of the JSON key with exactly its name.
    Auto,
    /// A JSONPaths document, one path per column, matched by position.
    JsonPaths(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Timestamp columns hold milliseconds since the Unix epoch.
    EpochMillis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatement {
    pub target: &'static Table,
    pub source_uri: String,
    /// Storage access principal; only meaningful to engines reading from S3.
    pub credential: String,
    pub region: String,
    pub format: JsonFormat,
    pub time_format: Option<TimeFormat>,
    pub max_errors: u32,
}

impl LoadStatement {
    /// LoadEvents: activity logs into `staging_events` through the configured
    /// JSONPaths document, with epoch-millisecond timestamps.
    pub fn events(config: &PipelineConfig) -> Self {
        Self {
            target: &STAGING_EVENTS_TABLE,
            source_uri: config.storage.events_uri.clone(),
            credential: config.credential_arn.clone(),
            region: config.storage.region.clone(),
            format: JsonFormat::JsonPaths(config.storage.events_format_spec.clone()),
            time_format: Some(TimeFormat::EpochMillis),
            max_errors: config.max_errors,
        }
    }

    /// LoadSongs: the song catalog into `staging_songs` with automatic
    /// key-to-column mapping.
    pub fn songs(config: &PipelineConfig) -> Self {
        Self {
            target: &STAGING_SONGS_TABLE,
            source_uri: config.storage.songs_uri.clone(),
            credential: config.credential_arn.clone(),
            region: config.storage.region.clone(),
            format: JsonFormat::Auto,
            time_format: None,
            max_errors: config.max_errors,
        }
    }

    pub fn render(&self, dialect: Dialect) -> Result<String, UnquotableLiteral> {
        match dialect {
            Dialect::Redshift => self.render_copy(),
            // SQLite has no COPY; the local bulk loader executes the statement.
            Dialect::Sqlite => Ok(format!(
                "-- {}: bulk load from {} ({})",
                self.target.name,
                dialect.quote_literal(&self.source_uri)?,
                match &self.format {
                    JsonFormat::Auto => "JSON 'auto'".to_string(),
                    JsonFormat::JsonPaths(uri) => format!("JSON {}", dialect.quote_literal(uri)?),
                }
            )),
        }
    }

    fn render_copy(&self) -> Result<String, UnquotableLiteral> {
        let quote = |s: &str| Dialect::Redshift.quote_literal(s);
        let mut sql = format!(
            "COPY {}\nFROM {}\nIAM_ROLE {}\nREGION {}\n",
            self.target.name,
            quote(&self.source_uri)?,
            quote(&self.credential)?,
            quote(&self.region)?
        );
        match &self.format {
            JsonFormat::Auto => sql.push_str("JSON 'auto'\n"),
            JsonFormat::JsonPaths(uri) => sql.push_str(&format!("JSON {}\n", quote(uri)?)),
        }
        if let Some(TimeFormat::EpochMillis) = self.time_format {
            sql.push_str("TIMEFORMAT 'epochmillisecs'\n");
        }
        sql.push_str(&format!("MAXERROR {}", self.max_errors));
        Ok(sql)
    }
}
