//! Storage notification batches.
//!
//! Each record names an uploaded object. The object is read, converted and
//! written back next to the input:
//!
//! - `input/report.txt` → `output/report.md`
//! - on failure, `input/report.txt` → `errors/report_error.json`
//!
//! Records are processed in order and independently; one failure never stops
//! the rest of the batch.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use mdgate_core::{
    BatchItemResult, BoxedBlobStore, BoxedConverter, Envelope, ProcessError, ProcessResult,
    PutObject, Response, ResponseBuilder, current_timestamp, is_storage_batch, records,
    storage_location,
};
use mdgate_framework::{EventHandler, HandlerResult, InvocationContext};

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";
const ERROR_CONTENT_TYPE: &str = "application/json";

/// Converts every object named in a storage notification batch.
pub struct StorageBatchHandler {
    store: BoxedBlobStore,
    converter: BoxedConverter,
}

impl StorageBatchHandler {
    pub fn new(store: BoxedBlobStore, converter: BoxedConverter) -> Self {
        Self { store, converter }
    }

    async fn process_record(&self, record: &Value) -> BatchItemResult {
        let Some(location) = storage_location(record) else {
            let error = ProcessError::MalformedRecord("missing bucket name or object key".into());
            warn!("Skipping record: {error}");
            return BatchItemResult::failed("unknown", error.to_string());
        };
        let bucket = location.bucket;
        let key = decode_key(location.key);

        info!(bucket, key = %key, "Processing file");

        match self.convert_object(bucket, &key).await {
            Ok(output) => {
                info!("Successfully converted {key} to {output}");
                BatchItemResult::succeeded(key, output)
            }
            Err(e) => {
                error!(bucket, key = %key, "Error processing file: {e}");
                self.save_error_info(bucket, &key, &e).await;
                BatchItemResult::failed(key, e.to_string())
            }
        }
    }

    async fn convert_object(&self, bucket: &str, key: &str) -> ProcessResult<String> {
        let content = self.store.get_object(bucket, key).await?;
        let conversion = self.converter.convert(&content, Some(key))?;

        let output = output_key(key);
        let object = PutObject::new(
            bucket,
            output.as_str(),
            conversion.markdown.into_bytes(),
            MARKDOWN_CONTENT_TYPE,
        )
        .with_metadata("original-format", conversion.metadata.original_format)
        .with_metadata("converted-at", conversion.metadata.converted_at);

        self.store.put_object(object).await?;
        Ok(output)
    }

    /// Writes the failure artifact. Failures here are logged and dropped.
    async fn save_error_info(&self, bucket: &str, key: &str, failure: &ProcessError) {
        let artifact = json!({
            "source_key": key,
            "error": failure.to_string(),
            "error_type": failure.kind(),
            "timestamp": current_timestamp(),
            "bucket": bucket,
        });
        let body = match serde_json::to_vec_pretty(&artifact) {
            Ok(body) => body,
            Err(e) => {
                error!("Error serializing error info: {e}");
                return;
            }
        };

        let target = error_key(key);
        match self
            .store
            .put_object(PutObject::new(bucket, target.as_str(), body, ERROR_CONTENT_TYPE))
            .await
        {
            Ok(()) => debug!(bucket, key = %target, "Saved error info"),
            Err(e) => error!(bucket, key = %target, "Error saving error info: {e}"),
        }
    }
}

#[async_trait]
impl EventHandler for StorageBatchHandler {
    fn name(&self) -> &str {
        "storage"
    }

    fn can_handle(&self, envelope: &Envelope) -> bool {
        is_storage_batch(envelope)
    }

    async fn handle(&self, envelope: &Envelope, _ctx: &InvocationContext) -> HandlerResult {
        let records = records(envelope).map(Vec::as_slice).unwrap_or_default();

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.process_record(record).await);
        }

        let response = ResponseBuilder::batch(results);
        if let Some(summary) = &response.summary {
            info!(
                total = summary.total,
                success = summary.success,
                errors = summary.errors,
                "Storage batch processed"
            );
        }
        Ok(Response::Batch(response))
    }
}

/// Decodes a notification object key: `+` is a space, then percent-decoding.
/// Byte sequences that are not UTF-8 become U+FFFD.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Key the converted markdown is written to.
pub fn output_key(input_key: &str) -> String {
    let key = input_key.replace("input/", "output/");
    if key.ends_with(".md") {
        key
    } else {
        format!("{}.md", strip_extension(&key))
    }
}

/// Key the failure artifact is written to.
pub fn error_key(input_key: &str) -> String {
    let key = input_key.replace("input/", "errors/");
    format!("{}_error.json", strip_extension(&key))
}

/// Drops the extension of the last path component. Leading dots of the
/// component do not start an extension.
fn strip_extension(key: &str) -> &str {
    let name_start = key.rfind('/').map_or(0, |slash| slash + 1);
    let name = &key[name_start..];
    let stem_start = name.len() - name.trim_start_matches('.').len();

    match name[stem_start..].rfind('.') {
        Some(dot) => &key[..name_start + stem_start + dot],
        None => key,
    }
}
