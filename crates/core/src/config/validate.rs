use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Default codec/quality/preset tokens belong to their sets
/// - Probe timeout, error detail limit and placeholder duration are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .defaults
        .parse()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.tools.probe_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tools.probe_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.executor.max_error_detail_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "executor.max_error_detail_bytes cannot be 0".to_string(),
        ));
    }

    let placeholder = config.executor.unknown_duration_secs;
    if !placeholder.is_finite() || placeholder <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "executor.unknown_duration_secs must be positive, got {}",
            placeholder
        )));
    }

    Ok(())
}
