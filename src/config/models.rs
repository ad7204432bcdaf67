use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Extraction API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
        }
    }
}

fn default_endpoint() -> String {
    "https://api.zyte.com/v1/extract".to_string()
}

/// Fetch engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Maximum simultaneously in-flight fetch tasks
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout, seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,
    /// Target aggregate request rate; the minimum inter-request interval
    /// is derived as 1/rate unless `min_interval_secs` overrides it
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    pub min_interval_secs: Option<f64>,
    /// Random extra spacing in [0, jitter_secs) added to each send slot
    #[serde(default)]
    pub jitter_secs: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            min_interval_secs: None,
            jitter_secs: 0.0,
            max_retries: default_max_retries(),
        }
    }
}

impl FetcherConfig {
    pub fn min_interval(&self) -> Duration {
        let secs = self
            .min_interval_secs
            .unwrap_or(1.0 / self.requests_per_second);
        Duration::from_secs_f64(secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_secs_f64(self.jitter_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }
}

fn default_concurrency() -> usize {
    20
}

fn default_timeout_secs() -> f64 {
    30.0
}

fn default_connect_timeout_secs() -> f64 {
    10.0
}

fn default_requests_per_second() -> f64 {
    2.0
}

fn default_max_retries() -> u32 {
    3
}

/// Cache storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("data/raw")
}
