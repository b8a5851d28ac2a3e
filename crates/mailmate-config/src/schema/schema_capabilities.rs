//! Per-capability default options.

use serde::{Deserialize, Serialize};

/// Defaults used when the registry creates long-lived instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    #[serde(default = "default_language_model")]
    pub language_model: GenerationConfig,

    #[serde(default = "default_writer")]
    pub writer: GenerationConfig,

    #[serde(default)]
    pub rewriter: RewriterConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Context string handed to writer and rewriter.
    #[serde(default = "default_shared_context")]
    pub shared_context: String,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            language_model: default_language_model(),
            writer: default_writer(),
            rewriter: RewriterConfig::default(),
            summarizer: SummarizerConfig::default(),
            translator: TranslatorConfig::default(),
            shared_context: default_shared_context(),
        }
    }
}

fn default_language_model() -> GenerationConfig {
    GenerationConfig {
        max_tokens: 2000,
        temperature: 0.7,
        top_k: Some(3),
    }
}

fn default_writer() -> GenerationConfig {
    GenerationConfig {
        max_tokens: 1000,
        temperature: 0.7,
        top_k: None,
    }
}

fn default_shared_context() -> String {
    "Professional email communication".to_string()
}

/// Token and sampling settings for generative capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(default)]
    pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    #[serde(default = "default_as_is")]
    pub tone: String,
    #[serde(default = "default_as_is")]
    pub length: String,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            tone: default_as_is(),
            length: default_as_is(),
        }
    }
}

fn default_as_is() -> String {
    "as-is".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summary_type")]
    pub summary_type: String,
    #[serde(default = "default_summary_format")]
    pub format: String,
    #[serde(default = "default_summary_length")]
    pub length: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            summary_type: default_summary_type(),
            format: default_summary_format(),
            length: default_summary_length(),
        }
    }
}

fn default_summary_type() -> String {
    "key-points".to_string()
}

fn default_summary_format() -> String {
    "markdown".to_string()
}

fn default_summary_length() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_source_language")]
    pub default_source: String,
    #[serde(default = "default_target_language")]
    pub default_target: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            default_source: default_source_language(),
            default_target: default_target_language(),
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}
