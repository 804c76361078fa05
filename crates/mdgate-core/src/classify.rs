//! Event classification.
//!
//! Every predicate here is total and side-effect free: it only borrows the
//! [`Envelope`] and never panics, whatever shape the event has. The predicates
//! are mutually exclusive for well-formed events; when an event is ambiguous the
//! handler registry settles it through priorities, not this module.
//!
//! | Predicate                | Recognizes                                          |
//! |--------------------------|-----------------------------------------------------|
//! | [`is_storage_batch`]     | storage notifications (`Records[0].eventSource`)    |
//! | [`is_gateway_request`]   | REST-style (`httpMethod`) and HTTP-API-style (`requestContext`) requests |
//! | [`is_health_check`]      | `GET /health` gateway requests                      |
//! | [`is_direct_invocation`] | programmatic calls carrying a `content` field       |

use std::fmt;

use serde_json::Value;

use crate::envelope::Envelope;

/// Event source value storage notifications carry on each record.
pub const STORAGE_EVENT_SOURCE: &str = "aws:s3";

/// Path answered by the health handler.
pub const HEALTH_PATH: &str = "/health";

/// Keys under which a storage notification lists its records.
const RECORD_KEYS: [&str; 2] = ["Records", "records"];

/// The trigger shape of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// A batch of storage notification records.
    StorageBatch,
    /// A `GET /health` gateway request.
    Health,
    /// Any other gateway request.
    Gateway,
    /// A direct programmatic invocation.
    Direct,
    /// Nothing recognizable.
    Unclassified,
}

impl TriggerKind {
    /// Returns `true` for triggers answered with a gateway response.
    pub fn is_gateway(self) -> bool {
        matches!(self, Self::Gateway | Self::Health)
    }

    /// Returns a stable lowercase name, used as a log field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StorageBatch => "storage_batch",
            Self::Health => "health",
            Self::Gateway => "gateway",
            Self::Direct => "direct",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket and raw (still percent-encoded) object key of a storage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLocation<'a> {
    /// Bucket name.
    pub bucket: &'a str,
    /// Object key as delivered by the notification.
    pub key: &'a str,
}

/// Returns the record list of a storage notification, if any.
pub fn records(envelope: &Envelope) -> Option<&Vec<Value>> {
    RECORD_KEYS
        .iter()
        .find_map(|key| envelope.get(key).and_then(Value::as_array))
}

/// Extracts the bucket and object key of a single record.
///
/// Both the provider layout (`record.s3.bucket.name`) and the flattened layout
/// (`record.bucket.name`) are accepted.
pub fn storage_location(record: &Value) -> Option<StorageLocation<'_>> {
    let section = match record.get("s3") {
        Some(section) if section.is_object() => section,
        _ => record,
    };
    let bucket = section.pointer("/bucket/name")?.as_str()?;
    let key = section.pointer("/object/key")?.as_str()?;
    Some(StorageLocation { bucket, key })
}

/// Returns `true` if the envelope is a storage notification batch.
pub fn is_storage_batch(envelope: &Envelope) -> bool {
    let Some(first) = records(envelope).and_then(|records| records.first()) else {
        return false;
    };
    first.get("eventSource").and_then(Value::as_str) == Some(STORAGE_EVENT_SOURCE)
        && storage_location(first).is_some()
}

/// Returns `true` if the envelope is an HTTP gateway request.
pub fn is_gateway_request(envelope: &Envelope) -> bool {
    envelope.contains("httpMethod") || envelope.contains("requestContext")
}

/// Returns the upper-cased HTTP method of a gateway request.
pub fn http_method(envelope: &Envelope) -> Option<String> {
    envelope
        .get_str("httpMethod")
        .or_else(|| {
            envelope
                .pointer("/requestContext/http/method")
                .and_then(Value::as_str)
        })
        .map(str::to_ascii_uppercase)
}

/// Returns the request path of a gateway request.
pub fn request_path(envelope: &Envelope) -> Option<&str> {
    envelope
        .get_str("rawPath")
        .or_else(|| envelope.get_str("path"))
}

/// Returns `true` if the envelope is a `GET /health` gateway request.
pub fn is_health_check(envelope: &Envelope) -> bool {
    is_gateway_request(envelope)
        && http_method(envelope).as_deref() == Some("GET")
        && request_path(envelope) == Some(HEALTH_PATH)
}

/// Returns `true` if the envelope is a direct programmatic invocation.
pub fn is_direct_invocation(envelope: &Envelope) -> bool {
    envelope.contains("content")
        && !RECORD_KEYS.iter().any(|key| envelope.contains(key))
        && !is_gateway_request(envelope)
}

/// Classifies an envelope into its [`TriggerKind`].
pub fn classify(envelope: &Envelope) -> TriggerKind {
    if is_storage_batch(envelope) {
        TriggerKind::StorageBatch
    } else if is_health_check(envelope) {
        TriggerKind::Health
    } else if is_gateway_request(envelope) {
        TriggerKind::Gateway
    } else if is_direct_invocation(envelope) {
        TriggerKind::Direct
    } else {
        TriggerKind::Unclassified
    }
}
