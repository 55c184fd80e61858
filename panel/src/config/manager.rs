use super::Config;
use crate::errors::ConfigError;
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

pub const API_URL_ENV: &str = "NIMBUS_API_URL";
pub const STORAGE_PATH_ENV: &str = "NIMBUS_STORAGE_PATH";

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn from_config(config: Config) -> Result<Self> {
        Self::validate(&config)?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);

        let mut config = if Path::new(&main_config_path).exists() {
            let content = fs::read_to_string(&main_config_path).await.map_err(|e| {
                ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                }
            })?;
            debug!("Loaded config file {}", main_config_path);
            toml::from_str::<Config>(&content).map_err(|e| ConfigError::ParseError {
                reason: e.to_string(),
            })?
        } else {
            warn!("No config at {}, using defaults", main_config_path);
            Config::default()
        };

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;

        info!(
            "Configuration loaded: backend {} (timeout {}s), storage {}",
            config.api_base_url, config.request_timeout_seconds, config.storage_path
        );
        Ok(config)
    }

    fn apply_env_overrides(config: &mut Config) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                debug!("{} overrides api_base_url", API_URL_ENV);
                config.api_base_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var(STORAGE_PATH_ENV) {
            if !path.trim().is_empty() {
                debug!("{} overrides storage_path", STORAGE_PATH_ENV);
                config.storage_path = path.trim().to_string();
            }
        }
    }

    fn validate(config: &Config) -> Result<()> {
        let url = config.api_base_url.trim();
        if url.is_empty() {
            return Err(anyhow!(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: "must not be empty".to_string(),
            }));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", url),
            }));
        }
        if config.request_timeout_seconds == 0 {
            return Err(anyhow!(ConfigError::InvalidValue {
                field: "request_timeout_seconds".to_string(),
                reason: "must be greater than zero".to_string(),
            }));
        }
        Ok(())
    }
}
