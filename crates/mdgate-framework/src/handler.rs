//! The handler capability interface.
//!
//! A handler recognizes one class of envelope and processes it:
//!
//! ```rust,ignore
//! use mdgate_framework::{EventHandler, HandlerResult, InvocationContext};
//! use mdgate_core::{Envelope, Response};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl EventHandler for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     fn can_handle(&self, envelope: &Envelope) -> bool {
//!         envelope.contains("echo")
//!     }
//!
//!     async fn handle(&self, envelope: &Envelope, _ctx: &InvocationContext) -> HandlerResult {
//!         Ok(Response::Direct(envelope.as_value().clone()))
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::error::HandlerResult;
use mdgate_core::Envelope;

/// A component that recognizes and processes one class of envelope.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if this handler can process `envelope`.
    ///
    /// Must be cheap and side-effect free; the registry calls it for every
    /// lookup.
    fn can_handle(&self, envelope: &Envelope) -> bool;

    /// Processes `envelope`.
    ///
    /// Failures the handler does not translate itself are returned as
    /// [`ProcessError`](mdgate_core::ProcessError); the dispatcher maps them to
    /// the trigger's error shape.
    async fn handle(&self, envelope: &Envelope, ctx: &InvocationContext) -> HandlerResult;
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn EventHandler>;
