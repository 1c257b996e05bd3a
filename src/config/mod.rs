mod file_config;

pub use file_config::{CredentialConfig, FileConfig, LoadConfig, StorageConfig, WarehouseConfig};

use crate::dialect::Dialect;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_REDSHIFT_PORT: u16 = 5439;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Malformed configuration {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Failed to read config file {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config file {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Fully resolved settings for one pipeline run.
///
/// Built once at startup and handed explicitly to whatever needs it; nothing
/// reads configuration from process-wide state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub credential_arn: String,
    pub storage: StorageSettings,
    /// Rejected records tolerated per bulk load before the load fails.
    pub max_errors: u32,
    pub warehouse: WarehouseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub events_uri: String,
    pub events_format_spec: String,
    pub songs_uri: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseSettings {
    Redshift(RedshiftSettings),
    Sqlite { path: PathBuf },
}

impl WarehouseSettings {
    pub fn dialect(&self) -> Dialect {
        match self {
            WarehouseSettings::Redshift(_) => Dialect::Redshift,
            WarehouseSettings::Sqlite { .. } => Dialect::Sqlite,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RedshiftSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for RedshiftSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    Redshift,
    Sqlite,
}

fn parse_engine(value: Option<&str>) -> Result<Engine, ConfigError> {
    match value.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("redshift") => Ok(Engine::Redshift),
        Some("sqlite") => Ok(Engine::Sqlite),
        Some(other) => Err(ConfigError::Malformed {
            key: "warehouse.engine".to_string(),
            reason: format!("unknown engine '{}', expected 'redshift' or 'sqlite'", other),
        }),
    }
}

/// Takes a required value, recording its key when absent or blank.
fn required(value: Option<String>, key: &str, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            missing.push(key.to_string());
            String::new()
        }
    }
}

fn malformed(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        key: key.to_string(),
        reason: reason.into(),
    }
}

impl PipelineConfig {
    /// Reads and resolves a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::resolve(FileConfig::load(path)?)
    }

    /// Resolves the optional file values into a validated config.
    ///
    /// Every missing required key is reported at once.
    pub fn resolve(file: FileConfig) -> Result<Self, ConfigError> {
        let credential = file.credential.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let load = file.load.unwrap_or_default();
        let warehouse = file.warehouse.unwrap_or_default();

        let engine = parse_engine(warehouse.engine.as_deref())?;

        let mut missing = Vec::new();
        let credential_arn = required(credential.arn, "credential.arn", &mut missing);
        let events_uri = required(storage.events_uri, "storage.events_uri", &mut missing);
        let events_format_spec = required(
            storage.events_format_spec,
            "storage.events_format_spec",
            &mut missing,
        );
        let songs_uri = required(storage.songs_uri, "storage.songs_uri", &mut missing);

        let warehouse_settings = match engine {
            Engine::Redshift => WarehouseSettings::Redshift(RedshiftSettings {
                host: required(warehouse.host, "warehouse.host", &mut missing),
                port: warehouse.port.unwrap_or(DEFAULT_REDSHIFT_PORT),
                dbname: required(warehouse.dbname, "warehouse.dbname", &mut missing),
                user: required(warehouse.user, "warehouse.user", &mut missing),
                // Passwords are taken verbatim, surrounding spaces included.
                password: match warehouse.password {
                    Some(p) if !p.is_empty() => p,
                    _ => {
                        missing.push("warehouse.password".to_string());
                        String::new()
                    }
                },
            }),
            Engine::Sqlite => WarehouseSettings::Sqlite {
                path: PathBuf::from(required(warehouse.path, "warehouse.path", &mut missing)),
            },
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let region = storage
            .region
            .map(|r| r.trim().to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.is_empty()
            || !region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(malformed(
                "storage.region",
                format!("'{}' is not a region name", region),
            ));
        }

        let config = Self {
            credential_arn,
            storage: StorageSettings {
                events_uri,
                events_format_spec,
                songs_uri,
                region,
            },
            max_errors: load.max_errors.unwrap_or(0),
            warehouse: warehouse_settings,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // These values end up in SQL literals; reject what cannot be quoted
        // before any statement runs.
        let dialect = self.warehouse.dialect();
        for (key, value) in [
            ("credential.arn", &self.credential_arn),
            ("storage.events_uri", &self.storage.events_uri),
            ("storage.events_format_spec", &self.storage.events_format_spec),
            ("storage.songs_uri", &self.storage.songs_uri),
            ("storage.region", &self.storage.region),
        ] {
            dialect
                .quote_literal(value)
                .map_err(|e| malformed(key, e.to_string()))?;
        }

        let WarehouseSettings::Redshift(redshift) = &self.warehouse else {
            return Ok(());
        };
        if !self.credential_arn.starts_with("arn:") {
            return Err(malformed(
                "credential.arn",
                "expected an IAM role ARN starting with 'arn:'",
            ));
        }
        for (key, uri) in [
            ("storage.events_uri", &self.storage.events_uri),
            ("storage.events_format_spec", &self.storage.events_format_spec),
            ("storage.songs_uri", &self.storage.songs_uri),
        ] {
            if !uri.starts_with("s3://") {
                return Err(malformed(
                    key,
                    format!("Redshift loads from s3:// sources, got '{}'", uri),
                ));
            }
        }
        if redshift.port == 0 {
            return Err(malformed("warehouse.port", "port must be non-zero"));
        }
        Ok(())
    }
}
