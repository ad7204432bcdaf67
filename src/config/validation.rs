use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("{field} must be a positive number: {value}")]
    NonPositiveDuration { field: &'static str, value: f64 },

    #[error("requests_per_second must be a positive number: {value}")]
    NonPositiveRate { value: f64 },

    #[error("jitter_secs must not be negative: {value}")]
    InvalidJitter { value: f64 },

    #[error("API key is missing (set ZYTE_API_KEY or PAGEVAULT_API_KEY)")]
    MissingApiKey,
}

/// Validate the entire configuration
///
/// Numeric checks run before the credential check so malformed settings
/// surface with a specific error regardless of the environment.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_fetcher(config)?;
    validate_credentials(config)?;
    Ok(())
}

fn validate_fetcher(config: &Config) -> Result<(), ValidationError> {
    let fetcher = &config.fetcher;

    if fetcher.concurrency == 0 {
        return Err(ValidationError::InvalidConcurrency);
    }

    check_positive("timeout_secs", fetcher.timeout_secs)?;
    check_positive("connect_timeout_secs", fetcher.connect_timeout_secs)?;

    match fetcher.min_interval_secs {
        Some(interval) => check_positive("min_interval_secs", interval)?,
        None => {
            if !(fetcher.requests_per_second > 0.0 && fetcher.requests_per_second.is_finite()) {
                return Err(ValidationError::NonPositiveRate {
                    value: fetcher.requests_per_second,
                });
            }
        }
    }

    if !(fetcher.jitter_secs >= 0.0 && fetcher.jitter_secs.is_finite()) {
        return Err(ValidationError::InvalidJitter {
            value: fetcher.jitter_secs,
        });
    }

    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveDuration { field, value })
    }
}

/// The credential is required before any task starts
fn validate_credentials(config: &Config) -> Result<(), ValidationError> {
    match config.api.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingApiKey),
    }
}
