use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Deserialize;

const ENV_PREFIX: &str = "TASKFLOW";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub mode: StorageMode,
}

/// Where tasks live. Server-assigned and timestamp ids never share a store.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Remote,
    Local,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 10,
            refresh_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Loads `config/default` when present, then `TASKFLOW__*` environment
    /// overrides. An explicit `file` replaces `config/default` and must exist.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let api = ApiConfig::default();
        let builder = config::Config::builder()
            .set_default("api.base_url", api.base_url)?
            .set_default("api.request_timeout_secs", api.request_timeout_secs as i64)?
            .set_default("api.refresh_timeout_secs", api.refresh_timeout_secs as i64)?
            .set_default("storage.path", "data/taskflow.json")?
            .set_default("storage.mode", "remote")?
            .set_default("log.level", "info")?;

        let builder = match file {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("config/default").required(false)),
        };

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
