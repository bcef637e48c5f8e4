use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - the output time pattern is not empty
/// - pagination and deadline bounds are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.timefmt.is_empty() {
        return Err(ConfigError::ValidationError(
            "search.timefmt cannot be empty".to_string(),
        ));
    }

    if config.search.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_pages cannot be 0".to_string(),
        ));
    }

    if config.search.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
