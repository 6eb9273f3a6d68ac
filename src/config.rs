//! Extractor configuration loader.
//!
//! Loads [`ExtractorConfig`] from YAML. The settings can either sit at the
//! top level of the document or under an `extractor` key, so they can share a
//! file with the rest of an application's configuration:
//!
//! ```yaml
//! extractor:
//!   default_context: api
//!   max_depth: 16
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contexts::{Contexts, DEFAULT_CONTEXT};

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Yaml(e) => write!(f, "Failed to parse YAML: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Yaml(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

/// Settings of an [`Extractor`](crate::Extractor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Context used by `extract_default`.
    pub default_context: String,

    /// Deepest nesting level the engine recurses into. Unbounded when unset,
    /// in which case cyclic object graphs recurse forever.
    pub max_depth: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_context: DEFAULT_CONTEXT.to_string(),
            max_depth: None,
        }
    }
}

impl ExtractorConfig {
    /// Load extractor configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid YAML, or holds
    /// invalid settings
    ///
    /// # Example
    /// ```ignore
    /// use objectable::ExtractorConfig;
    ///
    /// let config = ExtractorConfig::load_from_file("config/extractor.yaml")?;
    /// println!("Default context: {}", config.default_context);
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml_str(&contents)?;
        tracing::debug!(
            "Loaded extractor config from {} (default_context={}, max_depth={:?})",
            path.display(),
            config.default_context,
            config.max_depth
        );
        Ok(config)
    }

    /// Parse extractor configuration from a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)?;

        let section = match yaml.get("extractor").cloned() {
            Some(section) => section,
            None => yaml,
        };

        let config: ExtractorConfig = if section.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(section)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_context.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_context cannot be empty".to_string(),
            ));
        }

        if self.max_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn default_contexts(&self) -> Contexts {
        Contexts::single(self.default_context.as_str())
    }
}
