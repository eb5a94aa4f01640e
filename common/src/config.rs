use serde::Deserialize;
use std::fs;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendConfig {
    pub server_address: String,
    pub log_level: String,
    /// Origin allowed by the CORS layer; no CORS layer when absent.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yml::Error,
    },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_string(),
            source,
        })?;

        Self::from_yaml_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_string(),
            source,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// Applies `DATABASE_URL` and `SERVER_ADDRESS` from the process environment.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.common.database_url = url;
        }
        if let Some(address) = lookup(SERVER_ADDRESS_ENV).filter(|v| !v.is_empty()) {
            self.backend.server_address = address;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.common.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("common.database_url"));
        }
        if self.backend.server_address.trim().is_empty() {
            return Err(ConfigError::Missing("backend.server_address"));
        }
        Ok(())
    }
}
