//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod schema_capabilities;
mod schema_ui;

pub use schema_capabilities::*;
pub use schema_ui::*;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub initialization: InitializationConfig,

    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            observer: ObserverConfig::default(),
            dispatcher: DispatcherConfig::default(),
            initialization: InitializationConfig::default(),
            capabilities: CapabilitiesConfig::default(),
            ui: UiConfig::default(),
            languages: default_languages(),
            host: HostConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Display name for a language code, falling back to the code itself.
    pub fn language_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.languages
            .iter()
            .find(|l| l.code == code)
            .map(|l| l.name.as_str())
            .unwrap_or(code)
    }
}

/// DOM observer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Minimum gap between two scans.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl ObserverConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_throttle_ms() -> u64 {
    500
}

/// Tool action dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Extracted text must be longer than this to be used.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

impl DispatcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            min_content_chars: default_min_content_chars(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_min_content_chars() -> usize {
    10
}

/// Initialization retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl InitializationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for InitializationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

/// Which tabs the coordination context tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Substring a tab URL must contain.
    #[serde(default = "default_url_pattern")]
    pub url_pattern: String,
}

impl HostConfig {
    pub fn matches(&self, url: &str) -> bool {
        url.contains(&self.url_pattern)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            url_pattern: default_url_pattern(),
        }
    }
}

fn default_url_pattern() -> String {
    "mail.google.com".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
