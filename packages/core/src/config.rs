use std::fmt;

use crate::error::{Result, ServiceError};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Configuration for the hosted model.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct ModelConfig {
    pub model: String,
    pub api_key: String,
    pub temperature: f64,
    pub api_base_url: String,
    /// Request timeout. `None` keeps the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl ModelConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ServiceError::MissingCredential(API_KEY_VAR.into()))?;

        let model = lookup("GEMINI_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.into());

        let temperature = parse_or("GEMINI_TEMPERATURE", lookup("GEMINI_TEMPERATURE"), 0.0);

        let api_base_url = lookup("GEMINI_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let timeout_secs = lookup("GEMINI_TIMEOUT_SECS").and_then(|v| match v.parse() {
            Ok(secs) => Some(secs),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for GEMINI_TIMEOUT_SECS: {}. Ignoring.", v, e);
                None
            }
        });

        Ok(Self {
            model,
            api_key,
            temperature,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_key: impl Into<String>) -> ModelConfigBuilder {
        ModelConfigBuilder {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            temperature: 0.0,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_secs: None,
        }
    }
}

// The API key must never end up in logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, value: Option<String>, default: T) -> T
where
    T::Err: fmt::Display,
{
    match value {
        Some(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        None => default,
    }
}

/// Builder for constructing `ModelConfig` in tests.
pub struct ModelConfigBuilder {
    api_key: String,
    model: String,
    temperature: f64,
    api_base_url: String,
    timeout_secs: Option<u64>,
}

impl ModelConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn build(self) -> ModelConfig {
        ModelConfig {
            model: self.model,
            api_key: self.api_key,
            temperature: self.temperature,
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
            timeout_secs: self.timeout_secs,
        }
    }
}
