//! # mdgate
//!
//! Request dispatch for a serverless document-to-markdown converter.
//!
//! One entry point receives three kinds of triggers and answers each in its
//! own shape:
//!
//! ```text
//!                         ┌──────────────────────┐
//!  storage batch ───┐     │   HandlerRegistry    │     ┌─ batch results
//!  gateway request ─┼───▶ │ health 15            │ ───▶┼─ HTTP response
//!  direct call ─────┘     │ storage 10           │     └─ conversion / failure
//!                         │ gateway 5            │
//!                         └──────────────────────┘
//!                            │               │
//!                     ConfigResolver     Converter, BlobStore
//! ```
//!
//! - **Core**: envelope, classifier, response shapes, error taxonomy
//! - **Framework**: the `EventHandler` trait and the priority registry
//! - **Runtime**: configuration resolution, authorization, the concrete
//!   handlers and the [`Dispatcher`](runtime::Dispatcher)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mdgate::prelude::*;
//!
//! let dispatcher = Dispatcher::builder()
//!     .blob_store(Arc::new(my_blob_store))
//!     .secret_store(Arc::new(my_secret_store))
//!     .with_logging()
//!     .build()?;
//!
//! let response = dispatcher.dispatch(event, &InvocationContext::new()).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read settings from `mdgate.toml` (default)
//! - `json-log`: JSON log lines

pub use mdgate_core as core;
pub use mdgate_framework as framework;
pub use mdgate_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mdgate::prelude::*;
/// ```
pub mod prelude {
    // Entry point
    pub use mdgate_runtime::{DispatchError, Dispatcher, DispatcherBuilder};

    // Handlers and registry
    pub use mdgate_framework::{
        BoxedHandler, EventHandler, FunctionInfo, HandlerInitError, HandlerRegistry,
        HandlerResult, InvocationContext,
    };

    // Envelopes and responses
    pub use mdgate_core::{Envelope, ProcessError, Response, ResponseBuilder, TriggerKind};

    // Collaborators
    pub use mdgate_core::{BlobStore, Conversion, ConvertError, Converter};
    pub use mdgate_runtime::{ConfigResolver, SecretStore};
}
