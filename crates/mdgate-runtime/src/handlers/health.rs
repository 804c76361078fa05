//! `GET /health` on the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use mdgate_core::{Envelope, Response, ResponseBuilder, is_health_check};
use mdgate_framework::{EventHandler, HandlerResult, InvocationContext};

use crate::config::ConfigResolver;

/// Reports service identity and deployment details. Not authorized.
pub struct HealthHandler {
    resolver: Arc<ConfigResolver>,
}

impl HealthHandler {
    pub fn new(resolver: Arc<ConfigResolver>) -> Self {
        Self { resolver }
    }

    async fn setting(&self, key: &str, default: &str) -> String {
        self.resolver
            .get(key, Some(default))
            .await
            .unwrap_or_else(|| default.to_string())
    }
}

#[async_trait]
impl EventHandler for HealthHandler {
    fn name(&self) -> &str {
        "health"
    }

    fn can_handle(&self, envelope: &Envelope) -> bool {
        is_health_check(envelope)
    }

    async fn handle(&self, _envelope: &Envelope, ctx: &InvocationContext) -> HandlerResult {
        let mut info = json!({
            "status": "healthy",
            "service": self.setting("APP_NAME", "markdown-converter").await,
            "version": self.setting("APP_VERSION", "1.0.0").await,
            "region": self.setting("AWS_REGION", "unknown").await,
            "runtime": self.setting("AWS_EXECUTION_ENV", "unknown").await,
            "bucket": self.setting("INPUT_BUCKET", "not-configured").await,
        });

        if let (Some(function), Some(map)) = (ctx.function(), info.as_object_mut()) {
            map.insert(
                "function".to_string(),
                json!({
                    "name": function.name,
                    "version": function.version,
                    "memory_limit": function.memory_limit,
                    "request_id": function.request_id,
                }),
            );
        }

        Ok(Response::Gateway(ResponseBuilder::success(info)))
    }
}
