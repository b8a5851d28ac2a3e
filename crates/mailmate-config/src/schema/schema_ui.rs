//! Injected UI naming and language list.

use serde::{Deserialize, Serialize};

/// Attribute and class names used for injected controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Attribute set on a surface once tools are injected.
    #[serde(default = "default_marker_attribute")]
    pub marker_attribute: String,

    #[serde(default = "default_container_class")]
    pub container_class: String,

    #[serde(default = "default_button_class")]
    pub button_class: String,

    #[serde(default = "default_output_class")]
    pub output_class: String,

    #[serde(default = "default_loading_class")]
    pub loading_class: String,

    #[serde(default = "default_language_select_class")]
    pub language_select_class: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            marker_attribute: default_marker_attribute(),
            container_class: default_container_class(),
            button_class: default_button_class(),
            output_class: default_output_class(),
            loading_class: default_loading_class(),
            language_select_class: default_language_select_class(),
        }
    }
}

fn default_marker_attribute() -> String {
    "data-mailmate-tools".to_string()
}

fn default_container_class() -> String {
    "mailmate-tools-container".to_string()
}

fn default_button_class() -> String {
    "ai-tool-button".to_string()
}

fn default_output_class() -> String {
    "mailmate-output".to_string()
}

fn default_loading_class() -> String {
    "loading".to_string()
}

fn default_language_select_class() -> String {
    "language-select".to_string()
}

/// A selectable translation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    pub name: String,
}

impl LanguageConfig {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

pub(crate) fn default_languages() -> Vec<LanguageConfig> {
    [
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("zh", "Chinese"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
    ]
    .into_iter()
    .map(|(code, name)| LanguageConfig::new(code, name))
    .collect()
}
