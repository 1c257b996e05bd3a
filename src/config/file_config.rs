use super::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub credential: Option<CredentialConfig>,
    pub storage: Option<StorageConfig>,
    pub load: Option<LoadConfig>,
    pub warehouse: Option<WarehouseConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CredentialConfig {
    /// IAM principal the warehouse assumes to read from object storage.
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(alias = "eventsUri")]
    pub events_uri: Option<String>,
    /// JSONPaths document mapping event fields onto staging columns.
    #[serde(alias = "eventsFormatSpec")]
    pub events_format_spec: Option<String>,
    #[serde(alias = "songsUri")]
    pub songs_uri: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LoadConfig {
    #[serde(alias = "maxErrors")]
    pub max_errors: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WarehouseConfig {
    /// "redshift" or "sqlite"
    pub engine: Option<String>,
    // Redshift
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    // SQLite
    pub path: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: Default::default(),
            reason: e.to_string(),
        })
    }
}
