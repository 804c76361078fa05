//! Settings loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Settings file (`mdgate.toml`, with the `toml-config` feature)
//! 3. Deployment variables: `USE_SECRETS_MANAGER`, `SECRETS_PREFIX`, `STAGE`
//! 4. Prefixed variables (`MDGATE_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Prefixed variables use `__` as the nesting separator:
//!
//! - `MDGATE_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `MDGATE_RESOLVER__STAGE=dev` → `resolver.stage = "dev"`
//! - `MDGATE_LOGGING__FILTERS__MDGATE_CORE=trace` → `logging.filters.mdgate_core = "trace"`
//!
//! # Example
//!
//! ```rust,ignore
//! use mdgate_runtime::config::SettingsLoader;
//!
//! let settings = SettingsLoader::new().load()?;
//!
//! let settings = SettingsLoader::new()
//!     .file("./deploy/mdgate.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use tracing::{debug, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::RuntimeSettings;

/// Unprefixed variables read into `resolver.*`.
const DEPLOYMENT_VARS: &[&str] = &["USE_SECRETS_MANAGER", "SECRETS_PREFIX", "STAGE"];

/// File name searched for in each search path.
#[cfg(feature = "toml-config")]
const SETTINGS_FILE: &str = "mdgate.toml";

/// Settings loader with figment-based multi-source support.
pub struct SettingsLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific settings file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for the settings file.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific settings file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings programmatically, on top of every other source.
    pub fn merge(mut self, settings: RuntimeSettings) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(settings));
        self
    }

    /// Loads and returns the settings.
    pub fn load(self) -> ConfigResult<RuntimeSettings> {
        let figment = self.build_figment()?;

        let settings: RuntimeSettings = figment.extract()?;

        debug!(
            bundle = %settings.resolver.bundle_name(),
            use_secrets_manager = settings.resolver.use_secrets_manager,
            logging_level = %settings.logging.level,
            "Settings loaded"
        );

        Ok(settings)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(RuntimeSettings::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            debug!(path = %path.display(), "Loading settings file");
            figment = Self::merge_settings_file(figment, &path)?;
        } else {
            figment = self.load_settings_file(figment);
        }

        if self.load_env {
            trace!("Loading deployment and MDGATE_ environment variables");
            figment = figment
                .merge(
                    Env::raw()
                        .only(DEPLOYMENT_VARS)
                        .map(|key| format!("resolver.{}", key.as_str().to_ascii_lowercase()).into()),
                )
                .merge(Env::prefixed("MDGATE_").split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn merge_settings_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    #[cfg(feature = "toml-config")]
    fn load_settings_file(&self, figment: Figment) -> Figment {
        let search_paths = if self.search_paths.is_empty() {
            std::env::current_dir().into_iter().collect()
        } else {
            self.search_paths.clone()
        };

        for search_path in &search_paths {
            let path = search_path.join(SETTINGS_FILE);
            if path.exists() {
                debug!(path = %path.display(), "Loading settings file");
                return figment.merge(Toml::file(path));
            }
        }
        trace!("No settings file found, using defaults and environment");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_settings_file(&self, figment: Figment) -> Figment {
        if !self.search_paths.is_empty() {
            trace!("Settings file search skipped: toml-config feature disabled");
        }
        figment
    }
}

/// Loads settings from the default sources.
pub fn load_settings() -> ConfigResult<RuntimeSettings> {
    SettingsLoader::new().load()
}
