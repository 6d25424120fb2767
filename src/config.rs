use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{LegendasError, Result};

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "deepseek-r1:14b".to_string()
}

fn default_source_language() -> String {
    "English".to_string()
}

fn default_target_language() -> String {
    "Brazilian Portuguese".to_string()
}

fn default_batch_size() -> usize {
    50
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_seed() -> u64 {
    42
}

fn default_stop_sequences() -> Vec<String> {
    vec!["</INST>".to_string(), "[/INST]".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_language_tag() -> String {
    "pt_br".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for translation
    #[serde(default = "default_model")]
    pub model: String,
    /// Language name the subtitles are written in
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// Language name to translate into
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Number of entries sent per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between consecutive batches (milliseconds)
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Attempts per batch before giving up on an unparseable response
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Seed of the first request; each further request adds one
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,
    /// Stop sequences passed to the model
    #[serde(default = "default_stop_sequences")]
    pub stop_sequences: Vec<String>,
    /// HTTP timeout for a whole generate call (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Extra tries after a transport failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay (milliseconds), doubled on every retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for a single retry delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Extension tag of translated files: `movie.en.srt` -> `movie.<tag>.srt`
    #[serde(default = "default_language_tag")]
    pub language_tag: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_attempts: default_max_attempts(),
            base_seed: default_base_seed(),
            stop_sequences: default_stop_sequences(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            language_tag: default_language_tag(),
        }
    }
}

impl TranslateConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LegendasError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| LegendasError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LegendasError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LegendasError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(LegendasError::Config("translate.batch_size must be at least 1".to_string()));
        }
        if self.translate.max_attempts == 0 {
            return Err(LegendasError::Config("translate.max_attempts must be at least 1".to_string()));
        }
        if self.translate.model.trim().is_empty() {
            return Err(LegendasError::Config("translate.model must not be empty".to_string()));
        }
        if self.translate.endpoint.trim().is_empty() {
            return Err(LegendasError::Config("translate.endpoint must not be empty".to_string()));
        }
        if self.output.language_tag.trim().is_empty() {
            return Err(LegendasError::Config("output.language_tag must not be empty".to_string()));
        }
        Ok(())
    }
}
