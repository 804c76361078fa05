//! Settings schema definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Root settings structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeSettings {
    /// Where the configuration bundle lives and whether to use it.
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for [`ConfigResolver`](super::ConfigResolver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Consult the remote secret bundle before the environment.
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub use_secrets_manager: bool,

    #[serde(default = "default_secrets_prefix")]
    pub secrets_prefix: String,

    /// Deployment stage, e.g. `dev` or `prod`.
    #[serde(default = "default_stage")]
    pub stage: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            use_secrets_manager: true,
            secrets_prefix: default_secrets_prefix(),
            stage: default_stage(),
        }
    }
}

impl ResolverSettings {
    /// Name of the secret holding the configuration bundle:
    /// `{secrets_prefix}/{stage}/config`.
    pub fn bundle_name(&self) -> String {
        format!("{}/{}/config", self.secrets_prefix, self.stage)
    }
}

fn default_true() -> bool {
    true
}

fn default_secrets_prefix() -> String {
    "markdown-converter".to_string()
}

fn default_stage() -> String {
    "prod".to_string()
}

/// Accepts a real boolean, a number or any of the textual spellings
/// understood by [`parse_bool`](super::parse_bool).
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value == 1,
        Flag::Text(value) => super::parse_bool(&value),
    })
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Include thread IDs in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line number in each line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module level overrides, e.g. `mdgate_runtime = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolver_defaults() {
        let settings = ResolverSettings::default();
        assert!(settings.use_secrets_manager);
        assert_eq!(settings.bundle_name(), "markdown-converter/prod/config");
    }

    #[test]
    fn test_bundle_name_uses_prefix_and_stage() {
        let settings = ResolverSettings {
            secrets_prefix: "test".into(),
            stage: "dev".into(),
            ..Default::default()
        };
        assert_eq!(settings.bundle_name(), "test/dev/config");
    }

    #[test]
    fn test_use_secrets_manager_is_lenient() {
        let parse = |value: serde_json::Value| -> bool {
            serde_json::from_value::<ResolverSettings>(json!({ "use_secrets_manager": value }))
                .unwrap()
                .use_secrets_manager
        };

        assert!(parse(json!(true)));
        assert!(parse(json!("TRUE")));
        assert!(parse(json!("yes")));
        assert!(parse(json!(1)));
        assert!(!parse(json!("false")));
        assert!(!parse(json!("nope")));
        assert!(!parse(json!(0)));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings: RuntimeSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings.resolver, ResolverSettings::default());
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_logging_parses_lowercase_names() {
        let logging: LoggingConfig = serde_json::from_value(json!({
            "level": "debug",
            "format": "pretty",
            "output": "stderr",
            "filters": { "mdgate_runtime": "trace" }
        }))
        .unwrap();

        assert_eq!(logging.level, LogLevel::Debug);
        assert_eq!(logging.format, LogFormat::Pretty);
        assert_eq!(logging.output, LogOutput::Stderr);
        assert_eq!(logging.filters["mdgate_runtime"], LogLevel::Trace);
    }
}
