//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core services. Nothing in
//! the request path reads environment variables.

use crate::constants::{DEFAULT_DATABASE_PATH, DEFAULT_GENERATION_URL, GENERATION_MODEL};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Settings for the hosted text-generation service.
#[derive(Clone)]
pub struct GenerationConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GenerationConfig {
    /// Create a configuration for the fixed production model.
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            model: GENERATION_MODEL.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    generation: GenerationConfig,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(database_path: PathBuf, generation: GenerationConfig) -> Result<Self, ConfigError> {
        if database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }
        if generation.base_url().is_empty() {
            return Err(ConfigError::InvalidInput(
                "generation base URL cannot be empty".into(),
            ));
        }

        Ok(Self {
            database_path,
            generation,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }
}

/// Resolve the database path from an optional environment value.
///
/// `None` or a blank value falls back to `DEFAULT_DATABASE_PATH`.
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Resolve the generation base URL from an optional environment value.
pub fn generation_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_GENERATION_URL.to_string())
}

/// Normalise the API key from an optional environment value. Blank keys count as missing.
pub fn api_key_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
