//! API key authorization for gateway requests.

use std::sync::Arc;

use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::ConfigResolver;
use mdgate_core::Envelope;

/// Configuration key holding the expected API key.
pub const API_KEY_SETTING: &str = "API_KEY";

/// Checks gateway requests against the configured API key.
///
/// An absent or empty key disables the check. Otherwise the request must
/// carry the key as `Authorization: Bearer <key>` or `X-API-Key: <key>`;
/// header names match case-insensitively.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    resolver: Arc<ConfigResolver>,
}

impl ApiKeyAuth {
    pub fn new(resolver: Arc<ConfigResolver>) -> Self {
        Self { resolver }
    }

    /// Returns `true` if `envelope` may proceed.
    pub async fn validate(&self, envelope: &Envelope) -> bool {
        let expected = self
            .resolver
            .get(API_KEY_SETTING, None)
            .await
            .filter(|key| !key.is_empty());
        let Some(expected) = expected else {
            debug!("No API key configured, authorization disabled");
            return true;
        };

        match extract_credential(envelope) {
            Some(provided) => {
                let valid = keys_match(provided, &expected);
                if !valid {
                    warn!("Request carried an invalid API key");
                }
                valid
            }
            None => {
                warn!("Request carried no API key");
                false
            }
        }
    }
}

/// The credential presented by a request, bearer token first.
pub fn extract_credential(envelope: &Envelope) -> Option<&str> {
    let headers = envelope.get("headers").and_then(Value::as_object)?;

    if let Some(token) = header(headers, "authorization").and_then(|v| v.strip_prefix("Bearer ")) {
        return Some(token);
    }
    header(headers, "x-api-key").filter(|v| !v.is_empty())
}

fn header<'a>(headers: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str())
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
