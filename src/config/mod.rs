//! Configuration management for pagevault
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PAGEVAULT__<section>__<key>`
//!
//! Examples:
//! - `PAGEVAULT__FETCHER__CONCURRENCY=8`
//! - `PAGEVAULT__FETCHER__REQUESTS_PER_SECOND=0.5`
//! - `PAGEVAULT__STORAGE__ROOT=archive/raw`
//!
//! The API credential is environment-only: `ZYTE_API_KEY` (or
//! `PAGEVAULT_API_KEY`), never read from the TOML file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/pagevault.toml`.
//! This can be overridden using the `PAGEVAULT_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{ApiConfig, Config, FetcherConfig, StorageConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails (missing credential, invalid numeric settings).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files; the credential
    /// still comes from the environment.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        sources::load_secrets(&mut config);
        validation::validate(&config)?;
        Ok(config)
    }
}
