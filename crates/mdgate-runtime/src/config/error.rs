//! Errors raised while building [`RuntimeSettings`](super::RuntimeSettings).
//!
//! These only surface from [`DispatcherBuilder::build`](crate::DispatcherBuilder::build).
//! Lookups through the resolver never fail; they fall through to the next tier.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested settings file does not exist.
    #[error("Settings file not found: {0}")]
    FileNotFound(PathBuf),

    /// The settings file extension is unknown or its feature is disabled.
    #[error("Unsupported settings file format: .{0}")]
    UnsupportedFormat(String),

    /// Defaults, file and environment could not be merged into settings.
    #[error("Failed to extract settings: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("Invalid settings: {message}")]
    ValidationError { message: String },

    /// A resolver setting that names the secret bundle is empty.
    #[error("Missing required setting: {field}")]
    MissingField { field: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Extract(Box::new(error))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
