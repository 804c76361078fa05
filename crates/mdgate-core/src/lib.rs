//! # mdgate Core
//!
//! Foundation types for the mdgate request-dispatch layer.
//!
//! A single serverless entry point receives three kinds of triggers: storage
//! notifications, HTTP gateway requests and direct programmatic invocations.
//! This crate holds everything that is independent of how those triggers are
//! routed:
//!
//! - **Envelope**: the untyped inbound event ([`Envelope`])
//! - **Classifier**: pure predicates deciding the trigger shape ([`classify()`])
//! - **Responses**: wire shapes per trigger kind ([`ResponseBuilder`], [`Response`])
//! - **Errors**: the processing failure taxonomy ([`ProcessError`])
//! - **Collaborators**: the document [`Converter`] and the [`BlobStore`]
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌──────────┐     ┌──────────┐
//! │ Envelope │────▶│ Classifier │────▶│ Handler  │────▶│ Response │
//! └──────────┘     └────────────┘     └──────────┘     └──────────┘
//!                                       │      │
//!                                  Converter  BlobStore
//! ```

pub mod classify;
pub mod convert;
pub mod envelope;
pub mod error;
pub mod response;
pub mod storage;

pub use classify::{
    HEALTH_PATH, STORAGE_EVENT_SOURCE, StorageLocation, TriggerKind, classify, http_method,
    is_direct_invocation, is_gateway_request, is_health_check, is_storage_batch, records,
    request_path, storage_location,
};
pub use convert::{
    BoxedConverter, Conversion, ConversionMetadata, Converter, PlainTextConverter,
    current_timestamp, file_extension,
};
pub use envelope::{Envelope, is_truthy};
pub use error::{ConvertError, ProcessError, ProcessResult, StoreError};
pub use response::{
    BatchItemResult, BatchResponse, BatchSummary, GatewayBody, GatewayResponse,
    INTERNAL_ERROR_MESSAGE, ItemStatus, Response, ResponseBuilder,
};
pub use storage::{BlobStore, BoxedBlobStore, MemoryBlobStore, PutObject, StoredObject};
