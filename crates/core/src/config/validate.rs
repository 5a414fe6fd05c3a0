use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Indexer manager URL is set
/// - Cache TTL and availability batch size are positive
/// - A fallback playback URL exists
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.indexer.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "indexer.url cannot be empty".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs must be greater than 0".to_string(),
        ));
    }

    if config.debrid.availability_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "debrid.availability_batch_size must be greater than 0".to_string(),
        ));
    }

    if config.debrid.fallback_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "debrid.fallback_url cannot be empty".to_string(),
        ));
    }

    Ok(())
}
