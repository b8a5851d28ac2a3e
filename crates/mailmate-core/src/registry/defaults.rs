//! Name-specific options for probe and long-lived instances.

use mailmate_config::CapabilitiesConfig;
use mailmate_protocols::{CapabilityName, CapabilityOptions};

/// Options the registry passes to the provider, per capability.
///
/// Probes use small token budgets so availability checks stay cheap;
/// long-lived instances use the configured defaults.
#[derive(Debug, Clone)]
pub struct CapabilityDefaults {
    config: CapabilitiesConfig,
}

impl CapabilityDefaults {
    pub fn new(config: CapabilitiesConfig) -> Self {
        Self { config }
    }

    /// Minimal options for a throwaway availability probe.
    pub fn probe_options(&self, name: CapabilityName) -> CapabilityOptions {
        let options = CapabilityOptions::new();
        match name {
            CapabilityName::LanguageModel => options
                .with_max_tokens(100)
                .with_temperature(1.0)
                .with_top_k(3),
            CapabilityName::Summarizer => options.with_summary(
                self.config.summarizer.summary_type.clone(),
                self.config.summarizer.format.clone(),
                "short",
            ),
            CapabilityName::Translator => options.with_languages(
                self.config.translator.default_source.clone(),
                self.config.translator.default_target.clone(),
            ),
            CapabilityName::LanguageDetector => options,
            CapabilityName::Writer => options.with_max_tokens(100).with_temperature(1.0),
            CapabilityName::Rewriter => options.with_tone("as-is", "as-is"),
        }
    }

    /// Options for the cached instance created on first use.
    pub fn default_options(&self, name: CapabilityName) -> CapabilityOptions {
        let options = CapabilityOptions::new();
        let config = &self.config;
        match name {
            CapabilityName::LanguageModel => {
                let generation = &config.language_model;
                let options = options
                    .with_max_tokens(generation.max_tokens)
                    .with_temperature(generation.temperature);
                match generation.top_k {
                    Some(top_k) => options.with_top_k(top_k),
                    None => options,
                }
            }
            CapabilityName::Summarizer => options.with_summary(
                config.summarizer.summary_type.clone(),
                config.summarizer.format.clone(),
                config.summarizer.length.clone(),
            ),
            CapabilityName::Translator => self.translator_options(
                &config.translator.default_source,
                &config.translator.default_target,
            ),
            CapabilityName::LanguageDetector => options,
            CapabilityName::Writer => {
                let generation = &config.writer;
                let options = options
                    .with_max_tokens(generation.max_tokens)
                    .with_temperature(generation.temperature)
                    .with_shared_context(config.shared_context.clone());
                match generation.top_k {
                    Some(top_k) => options.with_top_k(top_k),
                    None => options,
                }
            }
            CapabilityName::Rewriter => options
                .with_tone(config.rewriter.tone.clone(), config.rewriter.length.clone())
                .with_shared_context(config.shared_context.clone()),
        }
    }

    /// Translator options for an explicit language pair.
    pub fn translator_options(&self, source: &str, target: &str) -> CapabilityOptions {
        CapabilityOptions::new()
            .with_languages(source, target)
            .with_preserve_formatting(true)
    }
}

impl Default for CapabilityDefaults {
    fn default() -> Self {
        Self::new(CapabilitiesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_options_are_minimal() {
        let defaults = CapabilityDefaults::default();
        let options = defaults.probe_options(CapabilityName::LanguageModel);
        assert_eq!(options.max_tokens, Some(100));
        assert_eq!(options.temperature, Some(1.0));
        assert_eq!(options.top_k, Some(3));

        let options = defaults.probe_options(CapabilityName::Summarizer);
        assert_eq!(options.length.as_deref(), Some("short"));
        assert_eq!(
            defaults.probe_options(CapabilityName::LanguageDetector),
            CapabilityOptions::new()
        );
    }

    #[test]
    fn test_default_options_follow_config() {
        let defaults = CapabilityDefaults::default();

        let writer = defaults.default_options(CapabilityName::Writer);
        assert_eq!(writer.max_tokens, Some(1000));
        assert_eq!(writer.top_k, None);
        assert_eq!(
            writer.shared_context.as_deref(),
            Some("Professional email communication")
        );

        let translator = defaults.default_options(CapabilityName::Translator);
        assert_eq!(translator.source_language.as_deref(), Some("en"));
        assert_eq!(translator.target_language.as_deref(), Some("es"));
        assert_eq!(translator.preserve_formatting, Some(true));

        let summarizer = defaults.default_options(CapabilityName::Summarizer);
        assert_eq!(summarizer.summary_type.as_deref(), Some("key-points"));
        assert_eq!(summarizer.length.as_deref(), Some("medium"));
    }

    #[test]
    fn test_custom_config() {
        let mut config = CapabilitiesConfig::default();
        config.rewriter.tone = "more-formal".to_string();
        let defaults = CapabilityDefaults::new(config);
        let rewriter = defaults.default_options(CapabilityName::Rewriter);
        assert_eq!(rewriter.tone.as_deref(), Some("more-formal"));
        assert_eq!(rewriter.length.as_deref(), Some("as-is"));
    }
}
