pub mod manager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
pub use manager::ConfigManager;

use crate::constants::http;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    pub log_level: Option<String>,
}

fn default_api_base_url() -> String {
    http::DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    http::REQUEST_TIMEOUT.as_secs()
}

fn default_storage_path() -> String {
    "data/panel.db".to_string()
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout(),
            storage_path: default_storage_path(),
            download_dir: default_download_dir(),
            log_level: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Base URL without a trailing slash so endpoint paths can be appended
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
