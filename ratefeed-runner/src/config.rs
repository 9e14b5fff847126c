//! Pipeline configuration, loadable from TOML.

use ratefeed_core::data::{DEFAULT_DAILY_URL, DEFAULT_KEY_RATE_URL};
use ratefeed_core::InstrumentCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the persisted store.
pub const DEFAULT_STORE_PATH: &str = "parsed_data/currency_rates.json";

/// Default instrument code for single-value key-rate sources.
pub const DEFAULT_KEY_RATE_CODE: &str = "KEY_RATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a pipeline run needs, passed in explicitly.
///
/// Missing keys in a TOML file fall back to the defaults:
///
/// ```toml
/// daily_url = "http://www.cbr.ru/scripts/XML_daily.asp"
/// key_rate_url = "https://www.cbr.ru/hd_base/KeyRate/"
/// store_path = "parsed_data/currency_rates.json"
/// key_rate_code = "KEY_RATE"
/// request_timeout_secs = 30
/// workers = 1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-day XML endpoint.
    pub daily_url: String,
    /// Key-rate listing page.
    pub key_rate_url: String,
    /// Store file; its sidecar lives next to it.
    pub store_path: PathBuf,
    /// Code under which single-value sources are stored.
    pub key_rate_code: String,
    /// Per-request timeout. Expiry counts as a fetch failure.
    pub request_timeout_secs: u64,
    /// Concurrent day fetches in a sweep. 1 means sequential.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            daily_url: DEFAULT_DAILY_URL.to_string(),
            key_rate_url: DEFAULT_KEY_RATE_URL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            key_rate_code: DEFAULT_KEY_RATE_CODE.to_string(),
            request_timeout_secs: 30,
            workers: 1,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        self.key_rate_code()?;
        Ok(())
    }

    pub fn key_rate_code(&self) -> Result<InstrumentCode, ConfigError> {
        InstrumentCode::new(&self.key_rate_code)
            .map_err(|e| ConfigError::Invalid(format!("key_rate_code: {e}")))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
