use disco_core::{Config, DiscoError, Result};
use disco_storage::{DiscoDriver, RestClient, size_in_mb};
use std::sync::Arc;

/// Builds a REST-backed driver after running the setup checks.
pub fn build_driver(config: Config) -> Result<DiscoDriver> {
    config.validate()?;
    let client = Arc::new(RestClient::from_config(&config)?);
    Ok(DiscoDriver::new(client, config))
}

/// Parses a volume size such as `20GB` or a bare `20` into gigabytes.
pub fn parse_size_gb(size: &str) -> Result<u64> {
    let size = size.trim().to_uppercase();
    let digits = size.strip_suffix("GB").unwrap_or(&size);

    let value = digits
        .trim()
        .parse::<u64>()
        .map_err(|_| DiscoError::ConfigError(format!("Invalid volume size '{size}'")))?;

    if value == 0 {
        return Err(DiscoError::ConfigError(
            "Volume size must be at least 1GB".to_string(),
        ));
    }
    size_in_mb(value)?;

    Ok(value)
}
