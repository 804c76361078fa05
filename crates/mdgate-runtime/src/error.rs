//! Runtime error types.

use mdgate_core::{ProcessError, TriggerKind};
use thiserror::Error;

pub use crate::config::error::{ConfigError, ConfigResult};

/// Failures the dispatcher hands back to the caller instead of a response.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No registered handler accepts a non-gateway envelope.
    #[error("No handler found for {trigger} event")]
    NoHandler {
        /// How the envelope was classified.
        trigger: TriggerKind,
    },

    /// A structural error on a direct invocation, propagated unchanged.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Result type for dispatch operations.
pub type RuntimeResult<T> = Result<T, DispatchError>;
