//! Run configuration, loaded once at startup and passed explicitly to the
//! stages that need it.
//!
//! The file is TOML:
//!
//! ```toml
//! [cluster]
//! host = "dwhcluster.example.us-west-2.redshift.amazonaws.com"
//! db_name = "dwh"
//! db_user = "dwhuser"
//! db_password = "..."
//! db_port = 5439
//!
//! [iam_role]
//! arn = "arn:aws:iam::123456789012:role/dwhRole"
//!
//! [s3]            # optional
//! log_data = "s3://udacity-dend/log_data"
//! song_data = "s3://udacity-dend/song_data"
//! region = "us-west-2"
//!
//! [pipeline]      # optional
//! commit_mode = "per_statement"   # or "single_transaction"
//! report_unmatched = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "DWH_CONFIG";
pub const PASSWORD_ENV: &str = "DWH_DB_PASSWORD";
pub const DEFAULT_CONFIG_PATH: &str = "dwh.toml";

pub const DEFAULT_PORT: u16 = 5439;
pub const DEFAULT_LOG_DATA: &str = "s3://udacity-dend/log_data";
pub const DEFAULT_SONG_DATA: &str = "s3://udacity-dend/song_data";
pub const DEFAULT_JSON_FORMAT: &str = "auto ignorecase";
pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub iam_role: IamRoleConfig,
    #[serde(default)]
    pub s3: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    #[serde(default = "default_port")]
    pub db_port: u16,
}

// Keeps the password out of logs.
impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_port", &self.db_port)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IamRoleConfig {
    pub arn: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub log_data: String,
    pub song_data: String,
    pub log_jsonpath: String,
    /// `None` defers to the AWS region provider chain.
    pub region: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_data: DEFAULT_LOG_DATA.to_string(),
            song_data: DEFAULT_SONG_DATA.to_string(),
            log_jsonpath: DEFAULT_JSON_FORMAT.to_string(),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Commit after every statement. A failure leaves earlier statements applied.
    #[default]
    PerStatement,
    /// Run every list inside one transaction. A failure rolls the whole run back.
    SingleTransaction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub commit_mode: CommitMode,
    pub report_unmatched: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::default(),
            report_unmatched: true,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    /// Loads the config from `DWH_CONFIG` (or `dwh.toml`) and applies env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load(&path)?;
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            info!("Using warehouse password from {PASSWORD_ENV}");
            config.cluster.db_password = password;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("cluster.host", &self.cluster.host)?;
        require_non_empty("cluster.db_name", &self.cluster.db_name)?;
        require_non_empty("cluster.db_user", &self.cluster.db_user)?;

        if !self.iam_role.arn.starts_with("arn:") {
            return Err(ConfigError::Invalid {
                key: "iam_role.arn",
                reason: format!("expected an IAM role ARN, got {:?}", self.iam_role.arn),
            });
        }

        for (key, path) in [
            ("s3.log_data", &self.s3.log_data),
            ("s3.song_data", &self.s3.song_data),
        ] {
            if !path.starts_with("s3://") {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("expected an s3:// path, got {path:?}"),
                });
            }
        }

        require_non_empty("s3.log_jsonpath", &self.s3.log_jsonpath)?;
        if let Some(region) = &self.s3.region {
            require_non_empty("s3.region", region)?;
        }
        Ok(())
    }
}

fn require_non_empty(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Picks the storage region: configured value, then the AWS default provider
/// chain, then `us-west-2`.
pub async fn resolve_region(storage: &StorageConfig) -> String {
    if let Some(region) = &storage.region {
        return region.clone();
    }

    let chain = aws_config::meta::region::RegionProviderChain::default_provider()
        .or_else(aws_config::Region::new(DEFAULT_REGION));
    let region = chain
        .region()
        .await
        .map(|r| r.as_ref().to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    info!("Resolved storage region: {region}");
    region
}
