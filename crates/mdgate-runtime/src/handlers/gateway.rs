//! HTTP gateway requests and direct invocations.
//!
//! Both carry a document to convert inline and answer with the conversion
//! payload; they differ only in framing. Gateway requests are authorized,
//! arrive as a (possibly base64) JSON body and always get an HTTP response.
//! Direct invocations are the JSON object itself.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use async_trait::async_trait;
use mdgate_core::{
    BoxedConverter, Envelope, GatewayResponse, INTERNAL_ERROR_MESSAGE, ProcessError,
    ProcessResult, Response, ResponseBuilder, is_direct_invocation, is_gateway_request,
    is_truthy,
};
use mdgate_framework::{EventHandler, HandlerResult, InvocationContext};

use crate::auth::ApiKeyAuth;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const MISSING_BODY_MESSAGE: &str = "Missing request body";
pub const MISSING_CONTENT_MESSAGE: &str = "Missing content in request";

const DIRECT_CONTEXT: &str = "Direct invocation";

/// Converts documents submitted over the gateway or by direct invocation.
pub struct GatewayHandler {
    auth: ApiKeyAuth,
    converter: BoxedConverter,
}

/// What a gateway body turned out to hold.
enum RequestPayload {
    /// A JSON object, expected to carry `content`.
    Object(Map<String, Value>),
    /// JSON that is not an object.
    Other,
    /// Not JSON at all; the bytes are the document.
    Raw(Vec<u8>),
}

impl GatewayHandler {
    pub fn new(auth: ApiKeyAuth, converter: BoxedConverter) -> Self {
        Self { auth, converter }
    }

    async fn handle_gateway(&self, envelope: &Envelope) -> GatewayResponse {
        if !self.auth.validate(envelope).await {
            return ResponseBuilder::error(401, UNAUTHORIZED_MESSAGE, None);
        }

        match self.process_gateway(envelope) {
            Ok(response) => response,
            Err(e) => {
                error!("Error in gateway handler: {e}");
                ResponseBuilder::error(
                    500,
                    INTERNAL_ERROR_MESSAGE,
                    Some(Value::String(e.to_string())),
                )
            }
        }
    }

    fn process_gateway(&self, envelope: &Envelope) -> ProcessResult<GatewayResponse> {
        let payload = match envelope.get("body") {
            Some(body) if is_truthy(body) => read_body(body, envelope.flag("isBase64Encoded"))?,
            _ => {
                debug!("Gateway request without body");
                return Ok(ResponseBuilder::error(400, MISSING_BODY_MESSAGE, None));
            }
        };

        let (content, filename) = match &payload {
            RequestPayload::Object(data) => match data.get("content") {
                Some(content) => (
                    content_bytes(content, data.get("base64").is_some_and(is_truthy))?,
                    data.get("filename").and_then(Value::as_str),
                ),
                None => return Ok(ResponseBuilder::error(400, MISSING_CONTENT_MESSAGE, None)),
            },
            RequestPayload::Other => {
                return Ok(ResponseBuilder::error(400, MISSING_CONTENT_MESSAGE, None));
            }
            RequestPayload::Raw(bytes) => (bytes.clone(), None),
        };

        let conversion = self.converter.convert(&content, filename)?;
        Ok(ResponseBuilder::success(conversion.to_value()))
    }

    fn handle_direct(&self, envelope: &Envelope) -> HandlerResult {
        let data = envelope
            .as_object()
            .ok_or_else(|| ProcessError::missing_field(DIRECT_CONTEXT, "content"))?;
        let content = data
            .get("content")
            .ok_or_else(|| ProcessError::missing_field(DIRECT_CONTEXT, "content"))?;

        let bytes = content_bytes(content, data.get("base64").is_some_and(is_truthy))?;
        let filename = data.get("filename").and_then(Value::as_str);

        let conversion = self.converter.convert(&bytes, filename)?;
        Ok(Response::Direct(conversion.to_value()))
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    fn name(&self) -> &str {
        "gateway"
    }

    fn can_handle(&self, envelope: &Envelope) -> bool {
        envelope.as_object().is_some()
            && (is_gateway_request(envelope) || is_direct_invocation(envelope))
    }

    async fn handle(&self, envelope: &Envelope, _ctx: &InvocationContext) -> HandlerResult {
        if is_gateway_request(envelope) {
            Ok(Response::Gateway(self.handle_gateway(envelope).await))
        } else {
            self.handle_direct(envelope)
        }
    }
}

/// Decodes a gateway body. Text that does not parse as JSON is the document.
fn read_body(body: &Value, base64_encoded: bool) -> ProcessResult<RequestPayload> {
    let text = match body {
        Value::String(text) => text,
        // Already-parsed bodies, as sent by some test harnesses.
        Value::Object(data) => return Ok(RequestPayload::Object(data.clone())),
        _ => return Ok(RequestPayload::Other),
    };

    let bytes = if base64_encoded {
        decode_base64(text).map_err(|e| ProcessError::decode("request body", e))?
    } else {
        text.as_bytes().to_vec()
    };

    Ok(match serde_json::from_slice(&bytes) {
        Ok(Value::Object(data)) => RequestPayload::Object(data),
        Ok(_) => RequestPayload::Other,
        Err(_) => {
            warn!("Request body is not JSON, treating it as the document");
            RequestPayload::Raw(bytes)
        }
    })
}

/// Document bytes from a `content` field.
fn content_bytes(content: &Value, base64_encoded: bool) -> ProcessResult<Vec<u8>> {
    let Value::String(text) = content else {
        return Err(ProcessError::invalid_field("content", "expected a string"));
    };
    if base64_encoded {
        decode_base64(text).map_err(|e| ProcessError::decode("content", e))
    } else {
        Ok(text.as_bytes().to_vec())
    }
}

/// Standard base64, ignoring the line breaks MIME-style encoders insert.
fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    BASE64.decode(compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigResolver, EnvSource, MapEnv, ResolverSettings};
    use mdgate_core::PlainTextConverter;
    use serde_json::json;
    use std::sync::Arc;

    fn handler(api_key: Option<&str>) -> GatewayHandler {
        let env = MapEnv::new();
        if let Some(key) = api_key {
            env.set("API_KEY", key);
        }
        let resolver = ConfigResolver::new(ResolverSettings {
            use_secrets_manager: false,
            ..Default::default()
        })
        .with_env(Arc::new(env) as Arc<dyn EnvSource>);

        GatewayHandler::new(
            ApiKeyAuth::new(Arc::new(resolver)),
            Arc::new(PlainTextConverter) as BoxedConverter,
        )
    }

    fn post(body: Value) -> Envelope {
        Envelope::new(json!({ "httpMethod": "POST", "headers": {}, "body": body }))
    }

    async fn gateway(handler: &GatewayHandler, envelope: Envelope) -> (u16, Value) {
        match handler.handle(&envelope, &InvocationContext::new()).await.unwrap() {
            Response::Gateway(response) => {
                let body = response.json_body().unwrap();
                (response.status_code, body)
            }
            other => panic!("expected a gateway response, got {other:?}"),
        }
    }

    #[test]
    fn test_can_handle() {
        let handler = handler(None);
        assert!(handler.can_handle(&post(json!("{}"))));
        assert!(handler.can_handle(&Envelope::new(json!({ "content": "x" }))));
        assert!(!handler.can_handle(&Envelope::new(json!({ "content": "x", "Records": [] }))));
        assert!(!handler.can_handle(&Envelope::new(json!({ "other": 1 }))));
        assert!(!handler.can_handle(&Envelope::new(json!("content"))));
    }

    #[tokio::test]
    async fn test_gateway_success() {
        let body = json!({ "content": "# Title", "filename": "doc.md" }).to_string();
        let (status, body) = gateway(&handler(None), post(Value::String(body))).await;

        assert_eq!(status, 200);
        assert_eq!(body["markdown"], "# Title");
        assert_eq!(body["metadata"]["original_format"], "md");
        assert_eq!(body["metadata"]["size"], 7);
    }

    #[tokio::test]
    async fn test_gateway_rejects_wrong_key() {
        let envelope = Envelope::new(json!({
            "httpMethod": "POST",
            "headers": { "Authorization": "Bearer WRONG" },
            "body": "{}"
        }));
        let (status, body) = gateway(&handler(Some("SECRET")), envelope).await;
        assert_eq!(status, 401);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_gateway_missing_body() {
        let handler = handler(None);
        for body in [Value::Null, json!("")] {
            let (status, body) = gateway(&handler, post(body)).await;
            assert_eq!(status, 400);
            assert_eq!(body["error"], "Missing request body");
        }

        let envelope = Envelope::new(json!({ "httpMethod": "POST" }));
        let (status, _) = gateway(&handler, envelope).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_gateway_missing_content() {
        let handler = handler(None);
        for body in [json!({ "filename": "a.txt" }).to_string(), "[1, 2]".to_string()] {
            let (status, body) = gateway(&handler, post(Value::String(body))).await;
            assert_eq!(status, 400);
            assert_eq!(body["error"], "Missing content in request");
        }
    }

    #[tokio::test]
    async fn test_gateway_raw_body_is_the_document() {
        let (status, body) = gateway(&handler(None), post(json!("just some text"))).await;
        assert_eq!(status, 200);
        assert_eq!(body["markdown"], "just some text");
        assert_eq!(body["metadata"]["original_format"], "text");
    }

    #[tokio::test]
    async fn test_gateway_base64_body_and_content() {
        let inner = json!({ "content": BASE64.encode("decoded"), "base64": true }).to_string();
        let envelope = Envelope::new(json!({
            "httpMethod": "POST",
            "body": BASE64.encode(inner),
            "isBase64Encoded": true
        }));

        let (status, body) = gateway(&handler(None), envelope).await;
        assert_eq!(status, 200);
        assert_eq!(body["markdown"], "decoded");
    }

    /// Encodes `data` and breaks it into 76-column lines.
    fn wrapped_base64(data: &[u8]) -> String {
        let encoded = BASE64.encode(data);
        encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_line_wrapped_base64_content() {
        let text = "a sixty byte payload that spans more than one base64 line...";
        let wrapped = wrapped_base64(text.as_bytes());
        assert!(wrapped.contains('\n'));

        let envelope = Envelope::new(json!({ "content": wrapped, "base64": true }));
        let response = handler(None)
            .handle(&envelope, &InvocationContext::new())
            .await
            .unwrap();
        let Response::Direct(payload) = response else {
            panic!("expected a direct response");
        };
        assert_eq!(payload["markdown"], text);

        let body = json!({ "content": wrapped, "base64": true }).to_string();
        let (status, body) = gateway(&handler(None), post(Value::String(body))).await;
        assert_eq!(status, 200);
        assert_eq!(body["markdown"], text);
    }

    #[tokio::test]
    async fn test_line_wrapped_base64_body() {
        let inner = json!({
            "content": "wrapped body",
            "filename": "a fairly long file name so the encoded body wraps.txt"
        })
        .to_string();
        let envelope = Envelope::new(json!({
            "httpMethod": "POST",
            "body": format!("{}\r\n", wrapped_base64(inner.as_bytes())),
            "isBase64Encoded": true
        }));

        let (status, body) = gateway(&handler(None), envelope).await;
        assert_eq!(status, 200);
        assert_eq!(body["markdown"], "wrapped body");
        assert_eq!(body["metadata"]["original_format"], "txt");
    }

    #[tokio::test]
    async fn test_gateway_processing_failures_are_500() {
        let handler = handler(None);

        let bad_base64 = json!({ "content": "***", "base64": true }).to_string();
        let (status, body) = gateway(&handler, post(Value::String(bad_base64))).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Internal server error");
        assert!(body["details"].as_str().unwrap().contains("base64"));

        let non_string = json!({ "content": 42 }).to_string();
        let (status, _) = gateway(&handler, post(Value::String(non_string))).await;
        assert_eq!(status, 500);

        let binary = json!({ "content": BASE64.encode([0xffu8, 0xfe]), "base64": true, "filename": "x.pdf" })
            .to_string();
        let (status, body) = gateway(&handler, post(Value::String(binary))).await;
        assert_eq!(status, 500);
        assert!(body["details"].as_str().unwrap().contains("Error converting to markdown"));
    }

    #[tokio::test]
    async fn test_direct_invocation() {
        let envelope = Envelope::new(json!({ "content": "hello", "filename": "notes.txt" }));
        let response = handler(None)
            .handle(&envelope, &InvocationContext::new())
            .await
            .unwrap();

        let Response::Direct(payload) = response else {
            panic!("expected a direct response");
        };
        assert_eq!(payload["markdown"], "hello");
        assert_eq!(payload["metadata"]["original_format"], "txt");
    }

    #[tokio::test]
    async fn test_direct_invocation_structural_errors() {
        let handler = handler(None);
        let ctx = InvocationContext::new();

        let err = handler
            .handle(&Envelope::new(json!({ "content": 1 })), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_structural());

        let err = handler
            .handle(&Envelope::new(json!({ "content": "%%%", "base64": true })), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "DecodeError");

        let err = handler.handle_direct(&Envelope::new(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Direct invocation requires 'content' field");
    }

    #[tokio::test]
    async fn test_direct_conversion_failure_is_not_structural() {
        let envelope = Envelope::new(json!({
            "content": BASE64.encode([0xffu8, 0x00, 0xfe]),
            "base64": true,
            "filename": "scan.pdf"
        }));
        let err = handler(None)
            .handle(&envelope, &InvocationContext::new())
            .await
            .unwrap_err();
        assert!(!err.is_structural());
        assert_eq!(err.kind(), "ConversionError");
    }
}
