//! Error types for the mdgate framework.

use mdgate_core::{ProcessError, Response};
use thiserror::Error;

/// Returned by a handler factory that cannot build its handler.
///
/// The registry logs the failure and leaves that handler out of the active
/// set; other handlers are unaffected.
#[derive(Debug, Clone, Error)]
#[error("failed to initialize handler '{handler}': {reason}")]
pub struct HandlerInitError {
    /// Registration name of the handler.
    pub handler: String,
    pub reason: String,
}

impl HandlerInitError {
    pub fn new(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

/// Result of [`EventHandler::handle`](crate::EventHandler::handle).
pub type HandlerResult = Result<Response, ProcessError>;
