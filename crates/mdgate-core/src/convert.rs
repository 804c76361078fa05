//! Document-to-markdown conversion.
//!
//! The conversion engine itself is an external capability behind the
//! [`Converter`] trait. [`PlainTextConverter`] covers UTF-8 text, which
//! converts to itself.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ConvertError;

/// Converts raw document bytes to markdown.
///
/// `hint` is a file name (or object key) used to pick the source format.
pub trait Converter: Send + Sync {
    fn convert(&self, content: &[u8], hint: Option<&str>) -> Result<Conversion, ConvertError>;
}

/// A shared converter.
pub type BoxedConverter = Arc<dyn Converter>;

/// Metadata attached to every conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionMetadata {
    /// Lower-cased extension of the hint, `"unknown"` without one, `"text"` without a hint.
    pub original_format: String,
    /// UTC ISO-8601 timestamp with a `Z` suffix.
    pub converted_at: String,
    /// Length of the markdown in characters.
    pub size: usize,
    pub title: Option<String>,
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub markdown: String,
    pub metadata: ConversionMetadata,
}

impl Conversion {
    /// Builds a conversion stamped with the current time.
    pub fn new(markdown: String, hint: Option<&str>, title: Option<String>) -> Self {
        let metadata = ConversionMetadata {
            original_format: hint.map_or_else(|| "text".to_string(), file_extension),
            converted_at: current_timestamp(),
            size: markdown.chars().count(),
            title,
        };
        Self { markdown, metadata }
    }

    /// The `{"markdown", "metadata"}` payload returned to callers.
    pub fn to_value(&self) -> Value {
        json!({
            "markdown": self.markdown,
            "metadata": {
                "original_format": self.metadata.original_format,
                "converted_at": self.metadata.converted_at,
                "size": self.metadata.size,
                "title": self.metadata.title,
            }
        })
    }
}

/// Lower-cased extension of the last path component, or `"unknown"`.
pub fn file_extension(filename: &str) -> String {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => "unknown".to_string(),
    }
}

/// Current UTC time, e.g. `2026-01-31T12:00:00.123456Z`.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Converts UTF-8 text to markdown by passing it through.
///
/// Binary content is rejected with [`ConvertError::UnsupportedBinary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextConverter;

impl Converter for PlainTextConverter {
    fn convert(&self, content: &[u8], hint: Option<&str>) -> Result<Conversion, ConvertError> {
        match std::str::from_utf8(content) {
            Ok(text) => Ok(Conversion::new(text.to_string(), hint, None)),
            Err(_) => Err(ConvertError::UnsupportedBinary {
                format: hint.map_or_else(|| "text".to_string(), file_extension),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF"), "pdf");
        assert_eq!(file_extension("input/a.b.txt"), "txt");
        assert_eq!(file_extension("README"), "unknown");
        assert_eq!(file_extension("dir.d/README"), "unknown");
    }

    #[test]
    fn test_plain_text_passthrough() {
        let conversion = PlainTextConverter
            .convert("# Título\n".as_bytes(), Some("notes.md"))
            .unwrap();
        assert_eq!(conversion.markdown, "# Título\n");
        assert_eq!(conversion.metadata.original_format, "md");
        assert_eq!(conversion.metadata.size, 9);
        assert!(conversion.metadata.converted_at.ends_with('Z'));
    }

    #[test]
    fn test_plain_text_without_hint() {
        let conversion = PlainTextConverter.convert(b"hello", None).unwrap();
        assert_eq!(conversion.metadata.original_format, "text");
        assert_eq!(conversion.to_value()["metadata"]["title"], Value::Null);
    }

    #[test]
    fn test_plain_text_rejects_binary() {
        let err = PlainTextConverter
            .convert(&[0xff, 0xfe, 0x00], Some("scan.pdf"))
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::UnsupportedBinary {
                format: "pdf".into()
            }
        );
    }
}
