//! mdgate Runtime - configuration, handlers and the dispatch entry point.
//!
//! This crate provides:
//! - Layered configuration resolution backed by a remote secret bundle
//!   ([`ConfigResolver`])
//! - Settings loading and validation ([`SettingsLoader`])
//! - API key authorization for gateway requests ([`ApiKeyAuth`])
//! - The concrete handlers: storage batch, gateway/direct and health
//! - The composition root and entry point ([`Dispatcher`])
//! - Logging configuration
//!
//! # Quick Start
//!
//! ```ignore
//! use mdgate_runtime::Dispatcher;
//! use mdgate_framework::InvocationContext;
//!
//! // Built once per execution environment, reused by warm invocations.
//! let dispatcher = Dispatcher::builder()
//!     .blob_store(my_blob_store)
//!     .secret_store(my_secret_store)
//!     .with_logging()
//!     .build()?;
//!
//! let response = dispatcher.dispatch(event, &InvocationContext::new()).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod runtime;

// Re-exports
pub use auth::ApiKeyAuth;
pub use config::{
    BoxedSecretStore, ConfigError, ConfigResolver, ConfigResult, EnvSource, MapEnv,
    MemorySecretStore, ProcessEnv, ResolverSettings, RuntimeSettings, SecretStore,
    SecretStoreError, SettingsLoader,
};
pub use error::{DispatchError, RuntimeResult};
pub use handlers::{GatewayHandler, HandlerDeps, HealthHandler, StorageBatchHandler};
pub use logging::LoggingBuilder;
pub use runtime::{Dispatcher, DispatcherBuilder};
