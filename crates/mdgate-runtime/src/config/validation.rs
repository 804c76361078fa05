//! Settings validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LoggingConfig, ResolverSettings, RuntimeSettings};

/// Validates the entire settings tree.
pub fn validate_settings(settings: &RuntimeSettings) -> ConfigResult<()> {
    validate_resolver_settings(&settings.resolver)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

fn validate_resolver_settings(resolver: &ResolverSettings) -> ConfigResult<()> {
    // Both segments are part of the bundle name even when secrets are off.
    if resolver.secrets_prefix.trim().is_empty() {
        return Err(ConfigError::missing_field("resolver.secrets_prefix"));
    }
    if resolver.stage.trim().is_empty() {
        return Err(ConfigError::missing_field("resolver.stage"));
    }

    if resolver.stage.contains('/') {
        return Err(ConfigError::validation(format!(
            "Stage must not contain '/': {}",
            resolver.stage
        )));
    }
    if resolver.secrets_prefix.ends_with('/') {
        return Err(ConfigError::validation(format!(
            "Secrets prefix must not end with '/': {}",
            resolver.secrets_prefix
        )));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter module name must not be empty: {module:?}"
        )));
    }
    Ok(())
}
