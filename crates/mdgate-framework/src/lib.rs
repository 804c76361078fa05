//! # mdgate Framework
//!
//! Handler dispatch building blocks.
//!
//! This layer provides:
//! - The [`EventHandler`] trait: "can this handler process this envelope" and
//!   "process it"
//! - [`InvocationContext`]: metadata about the running function
//! - [`HandlerRegistry`]: priority-ordered registrations, realized lazily on
//!   first lookup
//!
//! Concrete handlers live in the runtime crate; this crate only knows how to
//! order and find them.

pub mod context;
pub mod error;
pub mod handler;
pub mod registry;

pub use context::{FunctionInfo, InvocationContext};
pub use error::{HandlerInitError, HandlerResult};
pub use handler::{BoxedHandler, EventHandler};
pub use registry::{HandlerFactory, HandlerRegistry};
