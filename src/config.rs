//! Configuration for the Gemini endpoint and retry behavior

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::{debug, warn};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const API_BASE_VAR: &str = "GEMINI_API_BASE";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str
  = "gemini-2.5-flash-preview-09-2025";

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Max attempts per call, first one included
    pub max_attempts: usize
  , /// Backoff multiplier for retries
    pub backoff_multiplier: f32
  , /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64
  , /// Ceiling for a single backoff sleep in milliseconds
    pub max_backoff_ms: u64
}

/// Largest accepted backoff multiplier
pub const MAX_BACKOFF_MULTIPLIER: f32 = 10.0;

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_attempts: 3
          , backoff_multiplier: 2.0
          , initial_backoff_ms: 1000
          , max_backoff_ms: crate::retry::DEFAULT_MAX_BACKOFF_MS
        }
    }
}

/// docchat configuration
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{   /// Gemini API key, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>
  , /// API base URL
    pub api_base: String
  , /// Model name used in the endpoint path
    pub model: String
  , /// Per-attempt request timeout in seconds
    pub timeout_secs: u64
  , /// Timeout for the connectivity self-test
    pub self_test_timeout_secs: u64
  , /// Character budget for document text in one prompt
    pub max_document_chars: usize
  , /// Retry configuration
    pub retry: RetryConfig
}

impl Default for Config
{   fn default() -> Self
    {   Config
        {   api_key: None
          , api_base: DEFAULT_API_BASE.to_string()
          , model: DEFAULT_MODEL.to_string()
          , timeout_secs: 60
          , self_test_timeout_secs: 10
          , max_document_chars: 100_000
          , retry: RetryConfig::default()
        }
    }
}

// The key must not leak into logs through `{:?}`.
impl std::fmt::Debug for Config
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("Config")
          .field("api_key", &self.api_key.as_ref().map(|_| "***"))
          .field("api_base", &self.api_base)
          .field("model", &self.model)
          .field("timeout_secs", &self.timeout_secs)
          .field("self_test_timeout_secs", &self.self_test_timeout_secs)
          .field("max_document_chars", &self.max_document_chars)
          .field("retry", &self.retry)
          .finish()
    }
}

impl Config
{   /// Defaults plus environment overrides
    pub fn from_env() -> Self
    {   let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Load a JSON config file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("cannot read {}: {}", path.display(), e)
            )
          })?;
        let mut config: Config = serde_json::from_str(&raw)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("cannot parse {}: {}", path.display(), e)
            )
          })?;
        config.apply_env();
        Ok(config)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    fn apply_env(&mut self)
    {   if let Some(key) = env_value(API_KEY_VAR)
        {   self.api_key = Some(key);
        }
        if let Some(base) = env_value(API_BASE_VAR)
        {   self.api_base = base;
        }
        if let Some(model) = env_value(MODEL_VAR)
        {   self.model = model;
        }
        if let Some(raw) = env_value(TIMEOUT_VAR)
        {   match raw.parse::<u64>()
            {   Ok(secs) => self.timeout_secs = secs
              , Err(_) => warn!(
                  "Ignoring non-numeric {}: {}", TIMEOUT_VAR, raw
                )
            }
        }
    }

    /// Reject values the retry controller cannot work with
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   let invalid = |msg: &str| -> Result<(), crate::error::Error> {
          Err(crate::error::Error::InvalidConfiguration(
            msg.to_string()
          ))
        };
        if self.retry.max_attempts == 0
        {   return invalid("retry.max_attempts must be at least 1");
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite()
          || !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&multiplier)
        {   return invalid(
              "retry.backoff_multiplier must be between 1.0 and 10.0"
            );
        }
        if self.retry.max_backoff_ms == 0
          || self.retry.initial_backoff_ms > self.retry.max_backoff_ms
        {   return invalid(
              "retry.max_backoff_ms must be non-zero and >= initial_backoff_ms"
            );
        }
        if self.timeout_secs == 0 || self.self_test_timeout_secs == 0
        {   return invalid("timeouts must be non-zero");
        }
        if self.max_document_chars == 0
        {   return invalid("max_document_chars must be non-zero");
        }
        Ok(())
    }

    /// Key-bearing generateContent URL
    pub fn endpoint_url(&self)
      -> Result<String, crate::error::Error>
    {   let key = self.api_key.as_deref()
          .filter(|k| !k.is_empty())
          .ok_or_else(|| {
            crate::error::Error::MissingApiKey(
              API_KEY_VAR.to_string()
            )
          })?;
        Ok(format!(
          "{}/models/{}:generateContent?key={}",
          self.api_base.trim_end_matches('/'),
          self.model,
          key
        ))
    }

    pub fn has_api_key(&self) -> bool
    {   self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }

    pub fn self_test_timeout(&self) -> Duration
    {   Duration::from_secs(self.self_test_timeout_secs)
    }
}

fn env_value(var: &str) -> Option<String>
{   std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
