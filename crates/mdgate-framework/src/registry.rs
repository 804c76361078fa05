//! Priority-ordered handler registry.
//!
//! The [`HandlerRegistry`] holds handler *registrations*: a name, a priority
//! and a factory. Nothing is built at registration time. The first
//! [`resolve`](HandlerRegistry::resolve) realizes every registration once, in
//! priority order, and keeps the instances for the life of the registry:
//!
//! 1. Strictly higher priority is evaluated first
//! 2. Equal priorities are evaluated in registration order
//! 3. A factory that fails is logged and left out; the rest still load
//! 4. The first realized handler whose `can_handle` matches wins
//!
//! ```rust,ignore
//! use mdgate_framework::HandlerRegistry;
//!
//! let registry = HandlerRegistry::new();
//! registry.register("storage", 10, || Ok(Arc::new(StorageHandler::new()) as BoxedHandler));
//! registry.register("gateway", 5, || Ok(Arc::new(GatewayHandler::new()) as BoxedHandler));
//!
//! if let Some(handler) = registry.resolve(&envelope) {
//!     handler.handle(&envelope, &ctx).await?;
//! }
//! ```
//!
//! # Thread Safety
//!
//! Realization is a check-then-act step on shared state, so it runs under the
//! write half of a read-mostly lock. Once realized, lookups only take the read
//! lock.

use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::HandlerInitError;
use crate::handler::BoxedHandler;
use mdgate_core::Envelope;

/// Builds a handler instance.
pub type HandlerFactory = Box<dyn Fn() -> Result<BoxedHandler, HandlerInitError> + Send + Sync>;

struct Registration {
    name: String,
    priority: i32,
    factory: HandlerFactory,
}

#[derive(Default)]
struct RegistryState {
    /// Sorted by descending priority, stable for equal priorities.
    registrations: Vec<Registration>,
    /// Realized handlers, in evaluation order.
    active: Vec<BoxedHandler>,
    realized: bool,
}

impl RegistryState {
    fn realize(&mut self) {
        for registration in &self.registrations {
            match (registration.factory)() {
                Ok(handler) => {
                    debug!(
                        handler = %registration.name,
                        priority = registration.priority,
                        "Initialized handler"
                    );
                    self.active.push(handler);
                }
                Err(e) => {
                    error!(handler = %registration.name, "Error initializing handler: {e}");
                }
            }
        }
        self.realized = true;
        info!(
            active = self.active.len(),
            registered = self.registrations.len(),
            "Handler registry realized"
        );
    }

    fn find(&self, envelope: &Envelope) -> Option<BoxedHandler> {
        self.active
            .iter()
            .find(|handler| handler.can_handle(envelope))
            .cloned()
    }
}

/// An ordered collection of lazily constructed handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    state: RwLock<RegistryState>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler factory at `priority`. Never fails.
    ///
    /// The entry goes after every existing entry whose priority is greater
    /// than or equal to `priority`.
    ///
    /// Registrations added after the registry was realized are listed but
    /// stay inactive until [`clear`](Self::clear).
    pub fn register<F>(&self, name: impl Into<String>, priority: i32, factory: F)
    where
        F: Fn() -> Result<BoxedHandler, HandlerInitError> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut state = self.state.write();

        let position = state
            .registrations
            .iter()
            .position(|r| priority > r.priority)
            .unwrap_or(state.registrations.len());

        if state.realized {
            warn!(
                handler = %name,
                "Handler registered after the registry was realized; it stays inactive until the registry is cleared"
            );
        }
        debug!(handler = %name, priority, position, "Registered handler");

        state.registrations.insert(
            position,
            Registration {
                name,
                priority,
                factory: Box::new(factory),
            },
        );
    }

    /// Registers a handler factory (builder pattern).
    pub fn with<F>(self, name: impl Into<String>, priority: i32, factory: F) -> Self
    where
        F: Fn() -> Result<BoxedHandler, HandlerInitError> + Send + Sync + 'static,
    {
        self.register(name, priority, factory);
        self
    }

    /// Returns the first handler, in priority order, that can handle `envelope`.
    ///
    /// Realizes all registrations on first use. An empty registry is never
    /// realized, so handlers registered after a [`clear`](Self::clear) load
    /// on the next call.
    pub fn resolve(&self, envelope: &Envelope) -> Option<BoxedHandler> {
        {
            let state = self.state.read();
            if state.realized {
                return state.find(envelope);
            }
            if state.registrations.is_empty() {
                return None;
            }
        }

        let mut state = self.state.write();
        if !state.realized {
            state.realize();
        }
        state.find(envelope)
    }

    /// Drops every registration and realized instance.
    pub fn clear(&self) {
        let mut state = self.state.write();
        *state = RegistryState::default();
        debug!("Handler registry cleared");
    }

    /// Registration names in evaluation order.
    pub fn list_handlers(&self) -> Vec<String> {
        self.state
            .read()
            .registrations
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.state.read().registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once handlers have been instantiated.
    pub fn is_realized(&self) -> bool {
        self.state.read().realized
    }

    /// Number of realized handlers.
    pub fn active_count(&self) -> usize {
        self.state.read().active.len()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("HandlerRegistry")
            .field("registrations", &state.registrations.len())
            .field("active", &state.active.len())
            .field("realized", &state.realized)
            .finish()
    }
}
