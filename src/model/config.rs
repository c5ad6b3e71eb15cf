use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

const ENV_CONFIG_PATH: &str = "LEASE_CLIENT_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "client.yaml";

const ENV_API_BASE_URL: &str = "LEASE_API_BASE_URL";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

const ENV_POLL_INTERVAL_MS: &str = "LEASE_POLL_INTERVAL_MS";
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the lease analysis service.
    pub base_url: String,
    /// Cadence of the version status poller.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment and config file.
    ///
    /// Resolution order per field: environment variable, then config file,
    /// then the built-in default.
    pub fn from_env() -> Self {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = Self::load_config_file(&config_path).unwrap_or_default();

        let base_url = std::env::var(ENV_API_BASE_URL)
            .ok()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let base_url = match Url::parse(&base_url) {
            Ok(_) => base_url.trim_end_matches('/').to_string(),
            Err(e) => {
                tracing::warn!(url = %base_url, error = %e, "Invalid base URL, using default");
                DEFAULT_API_BASE_URL.to_string()
            }
        };

        let poll_interval_ms = std::env::var(ENV_POLL_INTERVAL_MS)
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(1);

        Self {
            base_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }
}
