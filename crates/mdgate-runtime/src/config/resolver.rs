//! Layered configuration lookups.
//!
//! A key resolves from the first tier that has it:
//!
//! 1. The per-key cache
//! 2. The configuration bundle: one JSON object stored as secret
//!    `{prefix}/{stage}/config`, fetched at most once and reused
//! 3. The environment
//! 4. The caller's default
//!
//! Every resolved value is cached, defaults included. A missing, unreadable
//! or malformed bundle is logged and treated as empty; lookups never fail.
//!
//! ```rust,ignore
//! let resolver = ConfigResolver::new(settings.resolver)
//!     .with_secret_store(store);
//!
//! let key = resolver.get("API_KEY", None).await;
//! let retries = resolver.get_int("MAX_RETRIES", 3).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, trace, warn};

use super::env::{EnvSource, ProcessEnv};
use super::schema::ResolverSettings;
use super::secrets::{BoxedSecretStore, SecretStore, SecretStoreError};

type Bundle = Arc<Map<String, Value>>;

/// Resolves configuration keys across the bundle, environment and defaults.
pub struct ConfigResolver {
    settings: ResolverSettings,
    secrets: Option<BoxedSecretStore>,
    env: Arc<dyn EnvSource>,
    /// `None` until the first bundle lookup; held across the fetch so
    /// concurrent first lookups share one fetch.
    bundle: Mutex<Option<Bundle>>,
    values: RwLock<HashMap<String, String>>,
}

impl ConfigResolver {
    /// Creates a resolver reading the process environment, with no secret
    /// store attached.
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            secrets: None,
            env: Arc::new(ProcessEnv),
            bundle: Mutex::new(None),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Attaches the store the bundle is fetched from.
    pub fn with_secret_store(mut self, store: BoxedSecretStore) -> Self {
        self.secrets = Some(store);
        self
    }

    /// Replaces the environment source.
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Name of the secret holding the configuration bundle.
    pub fn bundle_name(&self) -> String {
        self.settings.bundle_name()
    }

    /// Returns `true` if lookups consult the bundle.
    pub fn secrets_enabled(&self) -> bool {
        self.settings.use_secrets_manager && self.secrets.is_some()
    }

    /// Resolves `key`, falling back to `default`.
    pub async fn get(&self, key: &str, default: Option<&str>) -> Option<String> {
        let cached = self.values.read().get(key).cloned();
        if cached.is_some() {
            trace!(key, "Configuration cache hit");
            return cached;
        }

        let value = match self.bundle_value(key).await {
            Some(value) => {
                trace!(key, "Resolved from configuration bundle");
                Some(value)
            }
            None => self.env.var(key).or_else(|| default.map(str::to_string)),
        };

        if let Some(value) = &value {
            self.values.write().insert(key.to_string(), value.clone());
        }
        value
    }

    /// Resolves `key` as a boolean; see [`parse_bool`].
    pub async fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key, None)
            .await
            .map_or(default, |value| parse_bool(&value))
    }

    /// Resolves `key` as an integer, using `default` when absent or invalid.
    pub async fn get_int(&self, key: &str, default: i64) -> i64 {
        let Some(value) = self.get(key, None).await else {
            return default;
        };
        match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %value, "Invalid integer value, using default");
                default
            }
        }
    }

    /// Resolves `key` as JSON text, using `default` when absent or invalid.
    pub async fn get_json(&self, key: &str, default: Option<Value>) -> Option<Value> {
        let Some(value) = self.get(key, None).await else {
            return default;
        };
        match serde_json::from_str(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, "Invalid JSON value, using default: {e}");
                default
            }
        }
    }

    /// Forgets every cached value and the bundle.
    pub async fn clear_cache(&self) {
        *self.bundle.lock().await = None;
        self.values.write().clear();
        debug!("Configuration cache cleared");
    }

    /// Forgets the cached value for `key` and resolves it again.
    ///
    /// The bundle is not refetched; use [`clear_cache`](Self::clear_cache)
    /// for that.
    pub async fn refresh(&self, key: &str) -> Option<String> {
        self.values.write().remove(key);
        self.get(key, None).await
    }

    async fn bundle_value(&self, key: &str) -> Option<String> {
        if !self.settings.use_secrets_manager {
            return None;
        }
        let bundle = self.load_bundle().await?;
        bundle.get(key).and_then(bundle_text)
    }

    async fn load_bundle(&self) -> Option<Bundle> {
        let store = self.secrets.as_ref()?;

        let mut slot = self.bundle.lock().await;
        if let Some(bundle) = slot.as_ref() {
            return Some(Arc::clone(bundle));
        }

        let bundle = Arc::new(self.fetch_bundle(store.as_ref()).await);
        *slot = Some(Arc::clone(&bundle));
        Some(bundle)
    }

    /// Fetches and parses the bundle. Every failure yields an empty bundle.
    async fn fetch_bundle(&self, store: &dyn SecretStore) -> Map<String, Value> {
        let name = self.bundle_name();

        let text = match store.get_secret_string(&name).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!(secret = %name, "Secret has no string payload");
                return Map::new();
            }
            Err(SecretStoreError::NotFound(_)) => {
                debug!(secret = %name, "No configuration bundle, using environment");
                return Map::new();
            }
            Err(e) => {
                warn!(secret = %name, "Error getting secret: {e}");
                return Map::new();
            }
        };

        match serde_json::from_str(&text) {
            Ok(Value::Object(bundle)) => {
                debug!(secret = %name, keys = bundle.len(), "Loaded configuration bundle");
                bundle
            }
            Ok(_) => {
                error!(secret = %name, "Configuration bundle is not a JSON object");
                Map::new()
            }
            Err(e) => {
                error!(secret = %name, "Error parsing secret as JSON: {e}");
                Map::new()
            }
        }
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("bundle_name", &self.bundle_name())
            .field("secrets_enabled", &self.secrets_enabled())
            .field("cached", &self.values.read().len())
            .finish()
    }
}

/// Bundle values as text: strings verbatim, other JSON as its serialized
/// form. `null` counts as absent.
fn bundle_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// `true`, `1`, `yes` and `on` (any case, surrounding whitespace ignored)
/// are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;
    use crate::config::secrets::MemorySecretStore;
    use serde_json::json;

    const BUNDLE: &str = "test/dev/config";

    fn settings() -> ResolverSettings {
        ResolverSettings {
            use_secrets_manager: true,
            secrets_prefix: "test".into(),
            stage: "dev".into(),
        }
    }

    fn build(store: &Arc<MemorySecretStore>, env: &Arc<MapEnv>) -> ConfigResolver {
        ConfigResolver::new(settings())
            .with_secret_store(Arc::clone(store) as BoxedSecretStore)
            .with_env(Arc::clone(env) as Arc<dyn EnvSource>)
    }

    fn store_with(bundle: Value) -> Arc<MemorySecretStore> {
        Arc::new(MemorySecretStore::new().with_secret(BUNDLE, bundle.to_string()))
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "TRUE", " yes ", "1", "On"] {
            assert!(parse_bool(truthy), "{truthy}");
        }
        for falsy in ["false", "0", "no", "", "maybe"] {
            assert!(!parse_bool(falsy), "{falsy}");
        }
    }

    #[tokio::test]
    async fn test_bundle_takes_precedence_over_env() {
        let store = store_with(json!({ "API_KEY": "from-bundle" }));
        let env = Arc::new(MapEnv::new().with("API_KEY", "from-env"));
        let resolver = build(&store, &env);

        assert_eq!(
            resolver.get("API_KEY", None).await.as_deref(),
            Some("from-bundle")
        );
    }

    #[tokio::test]
    async fn test_env_then_default() {
        let store = store_with(json!({}));
        let env = Arc::new(MapEnv::new().with("REGION", "eu-west-1"));
        let resolver = build(&store, &env);

        assert_eq!(resolver.get("REGION", None).await.as_deref(), Some("eu-west-1"));
        assert_eq!(resolver.get("MISSING", Some("x")).await.as_deref(), Some("x"));
        assert_eq!(resolver.get("ABSENT", None).await, None);
    }

    #[tokio::test]
    async fn test_default_is_cached() {
        let store = store_with(json!({}));
        let env = Arc::new(MapEnv::new());
        let resolver = build(&store, &env);

        assert_eq!(resolver.get("K", Some("first")).await.as_deref(), Some("first"));
        env.set("K", "later");
        assert_eq!(resolver.get("K", Some("second")).await.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_bundle_fetched_once() {
        let store = store_with(json!({ "A": "1", "B": "2" }));
        let env = Arc::new(MapEnv::new());
        let resolver = build(&store, &env);

        resolver.get("A", None).await;
        resolver.get("B", None).await;
        resolver.get("C", None).await;
        resolver.get("A", None).await;

        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_bundle_falls_back_and_is_not_refetched() {
        let store = Arc::new(MemorySecretStore::new());
        let env = Arc::new(MapEnv::new().with("A", "env"));
        let resolver = build(&store, &env);

        assert_eq!(resolver.get("A", None).await.as_deref(), Some("env"));
        assert_eq!(resolver.get("B", None).await, None);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_falls_back_to_env() {
        let store = store_with(json!({ "A": "bundle" }));
        store.fail_with(Some(SecretStoreError::Unavailable("denied".into())));
        let env = Arc::new(MapEnv::new().with("A", "env"));
        let resolver = build(&store, &env);

        assert_eq!(resolver.get("A", None).await.as_deref(), Some("env"));
    }

    #[tokio::test]
    async fn test_malformed_bundle_is_treated_as_empty() {
        let store = Arc::new(MemorySecretStore::new().with_secret(BUNDLE, "{not json"));
        let env = Arc::new(MapEnv::new().with("A", "env"));
        let resolver = build(&store, &env);
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("env"));

        let store = Arc::new(MemorySecretStore::new().with_secret(BUNDLE, "[1, 2]"));
        let resolver = build(&store, &env);
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("env"));
    }

    #[tokio::test]
    async fn test_disabled_secrets_skip_the_store() {
        let store = store_with(json!({ "A": "bundle" }));
        let env = Arc::new(MapEnv::new().with("A", "env"));
        let resolver = ConfigResolver::new(ResolverSettings {
            use_secrets_manager: false,
            ..settings()
        })
        .with_secret_store(Arc::clone(&store) as BoxedSecretStore)
        .with_env(Arc::clone(&env) as Arc<dyn EnvSource>);

        assert!(!resolver.secrets_enabled());
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("env"));
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_non_string_bundle_values() {
        let store = store_with(json!({
            "N": 42,
            "B": true,
            "O": { "a": 1 },
            "Z": null
        }));
        let env = Arc::new(MapEnv::new().with("Z", "env"));
        let resolver = build(&store, &env);

        assert_eq!(resolver.get("N", None).await.as_deref(), Some("42"));
        assert_eq!(resolver.get("B", None).await.as_deref(), Some("true"));
        assert_eq!(resolver.get("O", None).await.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(resolver.get("Z", None).await.as_deref(), Some("env"));

        assert!(resolver.get_bool("B", false).await);
        assert_eq!(resolver.get_int("N", 0).await, 42);
        assert_eq!(resolver.get_json("O", None).await, Some(json!({ "a": 1 })));
    }

    #[tokio::test]
    async fn test_typed_getters_fall_back_to_defaults() {
        let store = store_with(json!({}));
        let env = Arc::new(
            MapEnv::new()
                .with("FLAG", "yes")
                .with("COUNT", " 7 ")
                .with("BAD_COUNT", "seven")
                .with("BAD_JSON", "{oops"),
        );
        let resolver = build(&store, &env);

        assert!(resolver.get_bool("FLAG", false).await);
        assert!(resolver.get_bool("UNSET_FLAG", true).await);
        assert_eq!(resolver.get_int("COUNT", 0).await, 7);
        assert_eq!(resolver.get_int("BAD_COUNT", 3).await, 3);
        assert_eq!(resolver.get_int("UNSET_COUNT", -1).await, -1);
        assert_eq!(
            resolver.get_json("BAD_JSON", Some(json!([]))).await,
            Some(json!([]))
        );
        assert_eq!(resolver.get_json("UNSET_JSON", None).await, None);
    }

    #[tokio::test]
    async fn test_clear_cache_refetches() {
        let store = store_with(json!({ "A": "old" }));
        let env = Arc::new(MapEnv::new());
        let resolver = build(&store, &env);
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("old"));

        store.set_secret(BUNDLE, json!({ "A": "new" }).to_string());
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("old"));

        resolver.clear_cache().await;
        assert_eq!(resolver.get("A", None).await.as_deref(), Some("new"));
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_keeps_the_bundle() {
        let store = store_with(json!({ "A": "old" }));
        let env = Arc::new(MapEnv::new().with("E", "one"));
        let resolver = build(&store, &env);
        resolver.get("A", None).await;
        resolver.get("E", None).await;

        store.set_secret(BUNDLE, json!({ "A": "new" }).to_string());
        env.set("E", "two");

        assert_eq!(resolver.refresh("A").await.as_deref(), Some("old"));
        assert_eq!(resolver.refresh("E").await.as_deref(), Some("two"));
        assert_eq!(store.fetch_count(), 1);
    }
}
