use std::path::{Path, PathBuf};
use std::sync::Arc;

use flightdelay_bucket::{BucketError, BucketStore, FsBucketStore, S3BucketStore, S3Config};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const ENV_PREFIX: &str = "FLIGHTDELAY_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub keys: ObjectKeys,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub s3: S3Config,
    /// Serve the bucket from this directory instead of S3.
    pub local_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectKeys {
    pub raw: String,
    pub processed: String,
    pub transformed: String,
    pub reports_prefix: String,
}

impl Default for ObjectKeys {
    fn default() -> Self {
        Self {
            raw: "flight_delays.csv".to_string(),
            processed: "flight_data_pipeline.csv".to_string(),
            transformed: "flight_delays_transformed_single.csv".to_string(),
            reports_prefix: "reports/".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the optional TOML file, then `FLIGHTDELAY_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

        let s3 = &mut self.storage.s3;
        if let Some(value) = var("BUCKET") {
            s3.bucket = value;
        }
        if let Some(value) = var("REGION") {
            s3.region = value;
        }
        if let Some(value) = var("S3_ENDPOINT") {
            s3.endpoint = Some(value);
        }
        if let Some(value) = var("ACCESS_KEY_ID") {
            s3.access_key_id = Some(value);
        }
        if let Some(value) = var("SECRET_ACCESS_KEY") {
            s3.secret_access_key = Some(value);
        }
        if let Some(value) = var("FORCE_PATH_STYLE") {
            s3.force_path_style = parse_bool(&format!("{ENV_PREFIX}FORCE_PATH_STYLE"), &value)?;
        }
        if let Some(value) = var("LOCAL_DIR") {
            self.storage.local_dir = Some(PathBuf::from(value));
        }

        let keys = &mut self.keys;
        if let Some(value) = var("RAW_KEY") {
            keys.raw = value;
        }
        if let Some(value) = var("PROCESSED_KEY") {
            keys.processed = value;
        }
        if let Some(value) = var("TRANSFORMED_KEY") {
            keys.transformed = value;
        }
        if let Some(value) = var("REPORTS_PREFIX") {
            keys.reports_prefix = value;
        }

        Ok(())
    }
}

impl StorageConfig {
    pub async fn connect(&self) -> Result<Arc<dyn BucketStore>, BucketError> {
        match &self.local_dir {
            Some(dir) => {
                info!(dir = %dir.display(), bucket = %self.s3.bucket, "using local bucket directory");
                Ok(Arc::new(FsBucketStore::new(dir, self.s3.bucket.clone())))
            }
            None => {
                info!(bucket = %self.s3.bucket, region = %self.s3.region, "connecting to S3");
                Ok(Arc::new(S3BucketStore::new(self.s3.clone()).await?))
            }
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
