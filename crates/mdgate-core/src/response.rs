//! Response shapes for each trigger kind.
//!
//! | Trigger        | Shape                                                   |
//! |----------------|---------------------------------------------------------|
//! | Gateway        | [`GatewayResponse`]: status, headers, string body       |
//! | Storage batch  | [`BatchResponse`]: per-record results plus a summary    |
//! | Direct         | the raw payload, or `{"error", "success": false}`       |
//!
//! [`ResponseBuilder::error_for`] picks the right failure shape for a trigger
//! kind, so the dispatcher can translate any escaped error uniformly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::classify::TriggerKind;

/// Message of every 500 gateway response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// =============================================================================
// Gateway
// =============================================================================

/// Body of a gateway response before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayBody {
    /// Serialized as JSON text.
    Json(Value),
    /// Sent verbatim.
    Text(String),
}

impl GatewayBody {
    fn into_string(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

impl From<Value> for GatewayBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for GatewayBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for GatewayBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A response for an HTTP gateway trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body text.
    pub body: String,
    /// Whether `body` is base64-encoded binary.
    pub is_base64_encoded: Option<bool>,
}

impl GatewayResponse {
    /// Sets or overrides a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Marks the body as base64-encoded binary.
    pub fn with_base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = Some(encoded);
        self
    }

    /// Parses the body back into JSON, if it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Converts into the wire document.
    pub fn into_value(self) -> Value {
        let mut value = json!({
            "statusCode": self.status_code,
            "headers": self.headers,
            "body": self.body,
        });
        if let (Some(encoded), Some(map)) = (self.is_base64_encoded, value.as_object_mut()) {
            map.insert("isBase64Encoded".to_string(), Value::Bool(encoded));
        }
        value
    }
}

// =============================================================================
// Storage batch
// =============================================================================

/// Outcome of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Error,
}

/// Result of processing one storage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    /// Decoded source key, or `"unknown"`.
    pub source: String,
    /// Key the converted document was written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub status: ItemStatus,
    /// Failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    /// A record converted and written to `output`.
    pub fn succeeded(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: Some(output.into()),
            status: ItemStatus::Success,
            error: None,
        }
    }

    /// A record that failed with `error`.
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: None,
            status: ItemStatus::Error,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Success
    }
}

/// Counts derived from a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

impl BatchSummary {
    /// Derives the counts from a result list.
    pub fn from_results(results: &[BatchItemResult]) -> Self {
        let success = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            success,
            errors: results.len() - success,
        }
    }
}

/// A response for a storage batch trigger.
///
/// The status code is always the trigger's success code; item failures are
/// reported inside the body.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub status_code: u16,
    pub results: Vec<BatchItemResult>,
    pub summary: Option<BatchSummary>,
}

impl BatchResponse {
    /// Converts into the wire document; the body is JSON text.
    pub fn into_value(self) -> Value {
        let mut body = json!({ "results": self.results });
        if let (Some(summary), Some(map)) = (self.summary, body.as_object_mut()) {
            map.insert("summary".to_string(), json!(summary));
        }
        json!({
            "statusCode": self.status_code,
            "body": body.to_string(),
        })
    }
}

// =============================================================================
// Response
// =============================================================================

/// A handler's response, shaped for its trigger kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Gateway(GatewayResponse),
    Batch(BatchResponse),
    /// Returned to a direct caller as-is.
    Direct(Value),
}

impl Response {
    /// Status code for gateway and batch responses.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Gateway(r) => Some(r.status_code),
            Self::Batch(r) => Some(r.status_code),
            Self::Direct(_) => None,
        }
    }

    /// Converts into the wire document handed back to the caller.
    pub fn into_value(self) -> Value {
        match self {
            Self::Gateway(r) => r.into_value(),
            Self::Batch(r) => r.into_value(),
            Self::Direct(v) => v,
        }
    }
}

impl From<GatewayResponse> for Response {
    fn from(response: GatewayResponse) -> Self {
        Self::Gateway(response)
    }
}

impl From<BatchResponse> for Response {
    fn from(response: BatchResponse) -> Self {
        Self::Batch(response)
    }
}

// =============================================================================
// ResponseBuilder
// =============================================================================

/// Constructors for every response shape.
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Headers every gateway response carries unless overridden.
    pub fn default_headers() -> BTreeMap<String, String> {
        [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
            (
                "Access-Control-Allow-Headers",
                "Content-Type,Authorization,X-API-Key",
            ),
            ("Access-Control-Allow-Methods", "GET,POST,OPTIONS"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// A gateway response with the default headers.
    pub fn gateway(status_code: u16, body: impl Into<GatewayBody>) -> GatewayResponse {
        GatewayResponse {
            status_code,
            headers: Self::default_headers(),
            body: body.into().into_string(),
            is_base64_encoded: None,
        }
    }

    /// A 200 gateway response carrying `data`.
    pub fn success(data: Value) -> GatewayResponse {
        Self::gateway(200, data)
    }

    /// A gateway error response: `{"error": message, "details"?: details}`.
    pub fn error(status_code: u16, message: &str, details: Option<Value>) -> GatewayResponse {
        let mut body = json!({ "error": message });
        if let (Some(details), Some(map)) = (details, body.as_object_mut()) {
            map.insert("details".to_string(), details);
        }
        Self::gateway(status_code, body)
    }

    /// A batch response with its derived summary.
    pub fn batch(results: Vec<BatchItemResult>) -> BatchResponse {
        let summary = BatchSummary::from_results(&results);
        BatchResponse {
            status_code: 200,
            results,
            summary: Some(summary),
        }
    }

    /// The direct-invocation failure shape.
    pub fn direct_failure(message: &str) -> Value {
        json!({ "error": message, "success": false })
    }

    /// Translates an escaped failure into the response shape of `trigger`.
    pub fn error_for(trigger: TriggerKind, message: &str) -> Response {
        match trigger {
            TriggerKind::Gateway | TriggerKind::Health => Response::Gateway(Self::error(
                500,
                INTERNAL_ERROR_MESSAGE,
                Some(Value::String(message.to_string())),
            )),
            TriggerKind::StorageBatch => {
                Response::Batch(Self::batch(vec![BatchItemResult::failed("unknown", message)]))
            }
            TriggerKind::Direct | TriggerKind::Unclassified => {
                Response::Direct(Self::direct_failure(message))
            }
        }
    }
}
