//! The dispatch entry point and its composition root.
//!
//! A [`Dispatcher`] is built once per execution environment and reused by
//! every warm invocation:
//!
//! ```rust,ignore
//! use mdgate_runtime::Dispatcher;
//!
//! let dispatcher = Dispatcher::builder()
//!     .blob_store(store)
//!     .secret_store(secrets)
//!     .with_logging()
//!     .build()?;
//!
//! // per invocation
//! let response = dispatcher.dispatch(event, &ctx).await?;
//! ```
//!
//! Dispatch classifies the envelope, asks the registry for a handler and
//! invokes it. Handler failures never escape as panics or raw errors for
//! gateway and storage triggers; they become that trigger's error response.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{
    BoxedSecretStore, ConfigResolver, ConfigResult, EnvSource, RuntimeSettings, SettingsLoader,
    validate_settings,
};
use crate::error::{DispatchError, RuntimeResult};
use crate::handlers::{HandlerDeps, register_default_handlers};
use crate::logging;
use mdgate_core::{
    BoxedBlobStore, BoxedConverter, Envelope, PlainTextConverter, ResponseBuilder, TriggerKind,
    classify,
};
use mdgate_framework::{HandlerRegistry, InvocationContext};

/// Gateway error text when nothing accepts the request.
pub const NO_HANDLER_MESSAGE: &str = "No handler found for event";

/// Routes envelopes to handlers and shapes failures per trigger kind.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    resolver: Arc<ConfigResolver>,
}

impl Dispatcher {
    /// Creates a dispatcher over existing services.
    pub fn new(registry: Arc<HandlerRegistry>, resolver: Arc<ConfigResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    /// Handles one invocation.
    ///
    /// Returns `Err` only for direct invocations shaped wrong and for
    /// non-gateway envelopes no handler accepts.
    pub async fn dispatch(&self, event: Value, ctx: &InvocationContext) -> RuntimeResult<Value> {
        let envelope = Envelope::new(event);
        let trigger = classify(&envelope);
        let span = info_span!(
            "dispatch",
            trigger = %trigger,
            request_id = ctx.request_id().unwrap_or("-")
        );

        self.dispatch_envelope(&envelope, trigger, ctx)
            .instrument(span)
            .await
    }

    async fn dispatch_envelope(
        &self,
        envelope: &Envelope,
        trigger: TriggerKind,
        ctx: &InvocationContext,
    ) -> RuntimeResult<Value> {
        debug!(event = %envelope, "Received event");

        let Some(handler) = self.registry.resolve(envelope) else {
            warn!("No handler found for event");
            if trigger.is_gateway() {
                return Ok(ResponseBuilder::error(400, NO_HANDLER_MESSAGE, None).into_value());
            }
            return Err(DispatchError::NoHandler { trigger });
        };
        debug!(handler = handler.name(), "Resolved handler");

        match handler.handle(envelope, ctx).await {
            Ok(response) => Ok(response.into_value()),
            Err(e)
                if e.is_structural()
                    && matches!(trigger, TriggerKind::Direct | TriggerKind::Unclassified) =>
            {
                warn!(handler = handler.name(), "Rejected invocation: {e}");
                Err(DispatchError::Process(e))
            }
            Err(e) => {
                error!(handler = handler.name(), kind = e.kind(), "Error in handler: {e}");
                Ok(ResponseBuilder::error_for(trigger, &e.to_string()).into_value())
            }
        }
    }
}

/// Builds a [`Dispatcher`] with its registry, resolver and default handlers.
pub struct DispatcherBuilder {
    loader: SettingsLoader,
    settings: Option<RuntimeSettings>,
    converter: Option<BoxedConverter>,
    blob_store: Option<BoxedBlobStore>,
    secret_store: Option<BoxedSecretStore>,
    env: Option<Arc<dyn EnvSource>>,
    init_logging: bool,
    default_handlers: bool,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            loader: SettingsLoader::new(),
            settings: None,
            converter: None,
            blob_store: None,
            secret_store: None,
            env: None,
            init_logging: false,
            default_handlers: true,
        }
    }

    /// Uses `settings` as-is instead of loading them.
    pub fn settings(mut self, settings: RuntimeSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets a specific settings file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Adds a search path for the settings file.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Disables loading settings from environment variables.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Merges settings programmatically over the loaded ones.
    pub fn merge(mut self, settings: RuntimeSettings) -> Self {
        self.loader = self.loader.merge(settings);
        self
    }

    /// The document converter. Defaults to [`PlainTextConverter`].
    pub fn converter(mut self, converter: BoxedConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// The object store storage batches read from and write to.
    pub fn blob_store(mut self, store: BoxedBlobStore) -> Self {
        self.blob_store = Some(store);
        self
    }

    /// The store holding the configuration bundle.
    pub fn secret_store(mut self, store: BoxedSecretStore) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// The environment the resolver reads. Defaults to the process environment.
    pub fn env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = Some(env);
        self
    }

    /// Initializes logging from the loaded settings during `build`.
    pub fn with_logging(mut self) -> Self {
        self.init_logging = true;
        self
    }

    /// Leaves the registry empty for the caller to fill.
    pub fn without_default_handlers(mut self) -> Self {
        self.default_handlers = false;
        self
    }

    pub fn build(self) -> ConfigResult<Dispatcher> {
        let settings = match self.settings {
            Some(settings) => settings,
            None => self.loader.load()?,
        };
        validate_settings(&settings)?;

        if self.init_logging {
            logging::init_from_config(&settings.logging);
        }

        let mut resolver = ConfigResolver::new(settings.resolver.clone());
        if let Some(env) = self.env {
            resolver = resolver.with_env(env);
        }
        if let Some(store) = self.secret_store {
            resolver = resolver.with_secret_store(store);
        }
        let resolver = Arc::new(resolver);

        let registry = Arc::new(HandlerRegistry::new());
        if self.default_handlers {
            let deps = HandlerDeps {
                resolver: Arc::clone(&resolver),
                converter: self
                    .converter
                    .unwrap_or_else(|| Arc::new(PlainTextConverter) as BoxedConverter),
                blob_store: self.blob_store,
            };
            register_default_handlers(&registry, &deps);
        }

        info!(
            bundle = %resolver.bundle_name(),
            secrets_enabled = resolver.secrets_enabled(),
            handlers = registry.len(),
            "Dispatcher ready"
        );

        Ok(Dispatcher::new(registry, resolver))
    }
}
