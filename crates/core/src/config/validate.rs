use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one job may run at a time
/// - Resolver and fetcher settings are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.jobs.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.resolver.ytdlp_path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "resolver.ytdlp_path cannot be empty".to_string(),
        ));
    }

    if config.resolver.timeout_secs == 0 || config.resolver.page_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "resolver timeouts must be greater than 0".to_string(),
        ));
    }

    if config.fetcher.languages.is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.languages must list at least one language".to_string(),
        ));
    }

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
