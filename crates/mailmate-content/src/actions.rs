//! Tool action vocabulary, prompts and result formatting.

use std::fmt;
use std::str::FromStr;

use mailmate_protocols::{CapabilityName, DetectionResult};
use serde::{Deserialize, Serialize};

/// A user-triggerable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionId {
    Write,
    Rewrite,
    Translate,
    Summarize,
    QuickResponse,
}

impl ActionId {
    pub const ALL: [ActionId; 5] = [
        ActionId::Write,
        ActionId::Rewrite,
        ActionId::Translate,
        ActionId::Summarize,
        ActionId::QuickResponse,
    ];

    /// Value of the control's `data-tool-id`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::Write => "write",
            ActionId::Rewrite => "rewrite",
            ActionId::Translate => "translate",
            ActionId::Summarize => "summarize",
            ActionId::QuickResponse => "quick-response",
        }
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            ActionId::Write => "Write",
            ActionId::Rewrite => "Rewrite",
            ActionId::Translate => "Translate",
            ActionId::Summarize => "Summarize",
            ActionId::QuickResponse => "Quick Response",
        }
    }

    /// Capability that produces the result. Translate also needs the
    /// language detector.
    pub fn capability(&self) -> CapabilityName {
        match self {
            ActionId::Write | ActionId::QuickResponse => CapabilityName::Writer,
            ActionId::Rewrite => CapabilityName::Rewriter,
            ActionId::Translate => CapabilityName::Translator,
            ActionId::Summarize => CapabilityName::Summarizer,
        }
    }

    /// Whether the result replaces the editor content instead of filling
    /// the output region.
    pub fn writes_editor(&self) -> bool {
        matches!(
            self,
            ActionId::Write | ActionId::Rewrite | ActionId::QuickResponse
        )
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

/// One activation of a tool, built from the surface it was clicked on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolActionRequest {
    pub action_id: ActionId,
    pub source_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

impl ToolActionRequest {
    pub fn new(action_id: ActionId, source_text: impl Into<String>) -> Self {
        Self {
            action_id,
            source_text: source_text.into(),
            subject: None,
            target_language: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = Some(language.into());
        self
    }
}

/// Prompt for composing from a subject and an optional draft.
pub fn write_prompt(subject: &str, body: &str) -> String {
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let task = if body.is_empty() {
        "\nGenerate a complete professional email body with proper paragraphs and spacing.".to_string()
    } else {
        format!(
            "\nCurrent email body:\n{}\n\nPlease improve and continue this email while maintaining the context and proper formatting.",
            body
        )
    };

    format!(
        "Write a professional email with proper formatting:\nSubject: {}\n{}\n\nEnsure to:\n\
         - Use proper paragraph spacing\n\
         - Include appropriate salutation and closing\n\
         - Maintain professional tone\n\
         - Use clear paragraph breaks",
        subject.trim(),
        task
    )
}

/// Prompt for answering the previous message in a thread.
pub fn reply_prompt(message: &str) -> String {
    format!(
        "Create a professional email response to this message:\n{}\n\
         Guidelines for the response:\n\
         1. Address the main points directly\n\
         2. Keep a professional and courteous tone\n\
         3. Be clear about any actions you'll take\n\
         4. Include specific next steps if needed\n\
         5. Close with a clear call to action if appropriate\n\
         Make the response concise but thorough, maintaining professionalism throughout.",
        message
    )
}

/// Tidy generated email text: drop a leading `Subject:` line, start a new
/// paragraph after every line that ends a sentence, and keep at most one
/// blank line between paragraphs.
pub fn clean_generated(text: &str) -> String {
    let text = text.trim();
    let body = match text.split_once('\n') {
        Some((first, rest)) if first.to_lowercase().starts_with("subject:") => rest,
        None if text.to_lowercase().starts_with("subject:") => "",
        _ => text,
    };

    let mut out: Vec<&str> = Vec::new();
    for line in body.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() && out.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
        if line.ends_with(['.', '!', '?']) {
            out.push("");
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Output region text for a translation.
pub fn format_translation(
    detected: &DetectionResult,
    source_name: &str,
    target_name: &str,
    translation: &str,
) -> String {
    format!(
        "Detected language: {} ({:.1}% confidence)\nTranslating to: {}\n\n{}",
        source_name,
        detected.confidence * 100.0,
        target_name,
        translation.trim()
    )
}
