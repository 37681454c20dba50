use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL is an http(s) URL
/// - Timeout and intake size ceiling are non-zero
/// - At least one accepted file extension
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must be an http(s) URL, got: {}",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.intake.max_file_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "intake.max_file_size_bytes cannot be 0".to_string(),
        ));
    }

    if config.intake.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "intake.allowed_extensions cannot be empty".to_string(),
        ));
    }

    Ok(())
}
