//! The concrete handlers and their default registration.
//!
//! | Handler                 | Priority | Accepts                          |
//! |-------------------------|----------|----------------------------------|
//! | [`HealthHandler`]       | 15       | `GET /health` gateway requests   |
//! | [`StorageBatchHandler`] | 10       | storage notification batches     |
//! | [`GatewayHandler`]      | 5        | gateway requests, direct calls   |
//!
//! Health sits above the gateway handler because every health check is also
//! a gateway request.

pub mod gateway;
pub mod health;
pub mod storage;

use std::sync::Arc;

use mdgate_core::{BoxedBlobStore, BoxedConverter};
use mdgate_framework::{BoxedHandler, HandlerInitError, HandlerRegistry};

use crate::auth::ApiKeyAuth;
use crate::config::ConfigResolver;

pub use gateway::GatewayHandler;
pub use health::HealthHandler;
pub use storage::StorageBatchHandler;

pub const HEALTH_PRIORITY: i32 = 15;
pub const STORAGE_PRIORITY: i32 = 10;
pub const GATEWAY_PRIORITY: i32 = 5;

/// Collaborators the default handlers are built from.
#[derive(Clone)]
pub struct HandlerDeps {
    pub resolver: Arc<ConfigResolver>,
    pub converter: BoxedConverter,
    /// Without a store the storage handler fails to build and is left out.
    pub blob_store: Option<BoxedBlobStore>,
}

/// Registers the health, storage and gateway handlers.
pub fn register_default_handlers(registry: &HandlerRegistry, deps: &HandlerDeps) {
    let resolver = Arc::clone(&deps.resolver);
    registry.register("health", HEALTH_PRIORITY, move || {
        Ok(Arc::new(HealthHandler::new(Arc::clone(&resolver))) as BoxedHandler)
    });

    let store = deps.blob_store.clone();
    let converter = Arc::clone(&deps.converter);
    registry.register("storage", STORAGE_PRIORITY, move || {
        let store = store
            .clone()
            .ok_or_else(|| HandlerInitError::new("storage", "no blob store configured"))?;
        Ok(Arc::new(StorageBatchHandler::new(store, Arc::clone(&converter))) as BoxedHandler)
    });

    let resolver = Arc::clone(&deps.resolver);
    let converter = Arc::clone(&deps.converter);
    registry.register("gateway", GATEWAY_PRIORITY, move || {
        let auth = ApiKeyAuth::new(Arc::clone(&resolver));
        Ok(Arc::new(GatewayHandler::new(auth, Arc::clone(&converter))) as BoxedHandler)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverSettings;
    use mdgate_core::{Envelope, MemoryBlobStore, PlainTextConverter};
    use serde_json::json;

    fn deps(blob_store: Option<BoxedBlobStore>) -> HandlerDeps {
        HandlerDeps {
            resolver: Arc::new(ConfigResolver::new(ResolverSettings::default())),
            converter: Arc::new(PlainTextConverter),
            blob_store,
        }
    }

    fn storage_event() -> Envelope {
        Envelope::new(json!({
            "Records": [{
                "eventSource": "aws:s3",
                "s3": { "bucket": { "name": "b" }, "object": { "key": "input/a.txt" } }
            }]
        }))
    }

    #[test]
    fn test_default_registration_order() {
        let registry = HandlerRegistry::new();
        let store: BoxedBlobStore = Arc::new(MemoryBlobStore::new());
        register_default_handlers(&registry, &deps(Some(store)));

        assert_eq!(registry.list_handlers(), vec!["health", "storage", "gateway"]);
    }

    #[test]
    fn test_routing() {
        let registry = HandlerRegistry::new();
        let store: BoxedBlobStore = Arc::new(MemoryBlobStore::new());
        register_default_handlers(&registry, &deps(Some(store)));

        let health = Envelope::new(json!({ "httpMethod": "GET", "path": "/health" }));
        let post = Envelope::new(json!({ "httpMethod": "POST", "path": "/convert" }));
        let direct = Envelope::new(json!({ "content": "x" }));

        assert_eq!(registry.resolve(&health).unwrap().name(), "health");
        assert_eq!(registry.resolve(&storage_event()).unwrap().name(), "storage");
        assert_eq!(registry.resolve(&post).unwrap().name(), "gateway");
        assert_eq!(registry.resolve(&direct).unwrap().name(), "gateway");
        assert!(registry.resolve(&Envelope::new(json!({ "ping": 1 }))).is_none());
    }

    #[test]
    fn test_storage_handler_left_out_without_store() {
        let registry = HandlerRegistry::new();
        register_default_handlers(&registry, &deps(None));

        assert!(registry.resolve(&storage_event()).is_none());
        assert_eq!(registry.active_count(), 2);
        assert_eq!(registry.len(), 3);
    }
}
