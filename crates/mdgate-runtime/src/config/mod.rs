//! Configuration for the mdgate runtime.
//!
//! Two layers live here:
//!
//! - **Settings**: how the runtime itself is set up (secret bundle naming,
//!   logging). Loaded once with [`SettingsLoader`] and validated.
//! - **Resolution**: per-key lookups made by handlers at invocation time,
//!   answered by [`ConfigResolver`] from the secret bundle, the environment
//!   or a caller default.

pub mod env;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod secrets;
pub mod validation;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{ConfigError, ConfigResult};
pub use loader::{SettingsLoader, load_settings};
pub use resolver::{ConfigResolver, parse_bool};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, ResolverSettings, RuntimeSettings};
pub use secrets::{BoxedSecretStore, MemorySecretStore, SecretStore, SecretStoreError};
pub use validation::validate_settings;
