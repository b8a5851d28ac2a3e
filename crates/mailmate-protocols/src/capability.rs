//! Capability names, availability maps, options and payloads.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;

/// The fixed set of capabilities an on-device provider may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityName {
    LanguageModel,
    Summarizer,
    Translator,
    LanguageDetector,
    Writer,
    Rewriter,
}

impl CapabilityName {
    /// All capabilities, in probe order.
    pub const ALL: [CapabilityName; 6] = [
        CapabilityName::LanguageModel,
        CapabilityName::Summarizer,
        CapabilityName::Translator,
        CapabilityName::LanguageDetector,
        CapabilityName::Writer,
        CapabilityName::Rewriter,
    ];

    /// Wire name of the capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityName::LanguageModel => "languageModel",
            CapabilityName::Summarizer => "summarizer",
            CapabilityName::Translator => "translator",
            CapabilityName::LanguageDetector => "languageDetector",
            CapabilityName::Writer => "writer",
            CapabilityName::Rewriter => "rewriter",
        }
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CapabilityName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown capability: {}", s))
    }
}

/// Availability of every known capability.
///
/// Always carries all six keys; a map built from partial data fills the
/// gaps with `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMap {
    entries: BTreeMap<CapabilityName, bool>,
}

impl CapabilityMap {
    /// A map with every capability unavailable.
    pub fn unavailable() -> Self {
        Self {
            entries: CapabilityName::ALL.into_iter().map(|n| (n, false)).collect(),
        }
    }

    /// Build a map where only the listed capabilities are available.
    pub fn with_available(names: &[CapabilityName]) -> Self {
        let mut map = Self::unavailable();
        for name in names {
            map.set(*name, true);
        }
        map
    }

    pub fn get(&self, name: CapabilityName) -> bool {
        self.entries.get(&name).copied().unwrap_or(false)
    }

    pub fn set(&mut self, name: CapabilityName, available: bool) {
        self.entries.insert(name, available);
    }

    /// Whether at least one capability is available.
    pub fn any_available(&self) -> bool {
        self.entries.values().any(|v| *v)
    }

    /// Names of the available capabilities.
    pub fn available(&self) -> Vec<CapabilityName> {
        self.entries
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CapabilityName, bool)> + '_ {
        CapabilityName::ALL.into_iter().map(|n| (n, self.get(n)))
    }
}

impl Default for CapabilityMap {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Options passed to the provider when creating an instance.
///
/// Each capability reads the subset of fields that applies to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_formatting: Option<bool>,
}

impl CapabilityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_summary(
        mut self,
        summary_type: impl Into<String>,
        format: impl Into<String>,
        length: impl Into<String>,
    ) -> Self {
        self.summary_type = Some(summary_type.into());
        self.format = Some(format.into());
        self.length = Some(length.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>, length: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self.length = Some(length.into());
        self
    }

    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_language = Some(source.into());
        self.target_language = Some(target.into());
        self
    }

    pub fn with_shared_context(mut self, context: impl Into<String>) -> Self {
        self.shared_context = Some(context.into());
        self
    }

    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = Some(preserve);
        self
    }
}

/// One language-detection candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub detected_language: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl DetectionResult {
    pub fn new(language: impl Into<String>, confidence: f64) -> Self {
        Self {
            detected_language: language.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Input to a capability instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl CapabilityRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Output of a capability instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityOutput {
    Text(String),
    /// Ordered most-confident first.
    Detections(Vec<DetectionResult>),
}

impl CapabilityOutput {
    pub fn into_text(self) -> Result<String, ProviderError> {
        match self {
            CapabilityOutput::Text(text) => Ok(text),
            CapabilityOutput::Detections(_) => Err(ProviderError::UnexpectedOutput {
                expected: "text",
            }),
        }
    }

    pub fn into_detections(self) -> Result<Vec<DetectionResult>, ProviderError> {
        match self {
            CapabilityOutput::Detections(mut results) => {
                results.sort_by(|a, b| {
                    b.confidence
                        .partial_cmp(&a.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(results)
            }
            CapabilityOutput::Text(_) => Err(ProviderError::UnexpectedOutput {
                expected: "detections",
            }),
        }
    }
}
