//! Error types for request processing.

use thiserror::Error;

/// Errors raised by a [`Converter`](crate::Converter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The content is not text and no converter handles the format.
    #[error("unsupported binary content for format '{format}'")]
    UnsupportedBinary {
        /// Format derived from the file name hint.
        format: String,
    },

    /// The conversion engine failed.
    #[error("{0}")]
    Engine(String),
}

/// Errors raised by a [`BlobStore`](crate::BlobStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// The storage backend rejected or failed the call.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures a handler reports while processing an envelope.
///
/// Structural errors describe a request that is shaped wrong; direct
/// invocations propagate them to the caller unchanged. Everything else is a
/// processing failure that gets translated into the trigger's error response.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// A required field is absent.
    #[error("{context} requires '{field}' field")]
    MissingField {
        /// What was being processed, e.g. "Direct invocation".
        context: &'static str,
        /// The missing field name.
        field: &'static str,
    },

    /// A field is present but unusable.
    #[error("invalid '{field}' field: {reason}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A base64 payload could not be decoded.
    #[error("failed to decode base64 {what}: {reason}")]
    Decode {
        /// Which payload, e.g. "request body".
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The document converter failed.
    #[error("Error converting to markdown: {0}")]
    Conversion(#[from] ConvertError),

    /// A blob store call failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A storage record lacks its bucket or key.
    #[error("malformed storage record: {0}")]
    MalformedRecord(String),
}

impl ProcessError {
    /// Creates a missing-field error.
    pub fn missing_field(context: &'static str, field: &'static str) -> Self {
        Self::MissingField { context, field }
    }

    /// Creates an invalid-field error.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a base64 decode error.
    pub fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    /// Stable name of the failure kind, recorded as `error_type` in error artifacts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "MissingField",
            Self::InvalidField { .. } => "InvalidField",
            Self::Decode { .. } => "DecodeError",
            Self::Conversion(_) => "ConversionError",
            Self::Storage(_) => "StorageError",
            Self::MalformedRecord(_) => "MalformedRecord",
        }
    }

    /// Returns `true` for request-shape errors.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::InvalidField { .. } | Self::Decode { .. }
        )
    }
}

/// Result type for request processing.
pub type ProcessResult<T> = Result<T, ProcessError>;
