//! Scripted provider and sample page for `simulate`.
//!
//! The provider answers every capability instantly with deterministic
//! text so the whole pipeline can be exercised without an AI engine.

use async_trait::async_trait;

use mailmate_content::Element;
use mailmate_protocols::{
    CapabilityInstance, CapabilityName, CapabilityOptions, CapabilityOutput, CapabilityProvider,
    CapabilityRequest, DetectionResult, ProviderError,
};

pub(crate) const SAMPLE_URL: &str = "https://mail.google.com/mail/u/0/#inbox/FMfcgzQ";

const STOPWORDS: &[(&str, &[&str])] = &[
    ("es", &["hola", "gracias", "el", "la", "que", "por", "para", "una"]),
    ("fr", &["bonjour", "merci", "le", "les", "est", "pour", "une", "nous"]),
    ("de", &["hallo", "danke", "der", "die", "und", "ist", "nicht", "wir"]),
];

pub(crate) struct DemoProvider;

#[async_trait]
impl CapabilityProvider for DemoProvider {
    fn id(&self) -> &str {
        "demo"
    }

    fn exposes(&self, _name: CapabilityName) -> bool {
        true
    }

    async fn create(
        &self,
        name: CapabilityName,
        options: &CapabilityOptions,
    ) -> Result<Box<dyn CapabilityInstance>, ProviderError> {
        Ok(Box::new(DemoInstance {
            name,
            options: options.clone(),
        }))
    }
}

struct DemoInstance {
    name: CapabilityName,
    options: CapabilityOptions,
}

#[async_trait]
impl CapabilityInstance for DemoInstance {
    fn capability(&self) -> CapabilityName {
        self.name
    }

    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, ProviderError> {
        let text = request.text.trim();
        let output = match self.name {
            CapabilityName::LanguageDetector => CapabilityOutput::Detections(detect(text)),
            CapabilityName::Summarizer => CapabilityOutput::Text(summarize(text)),
            CapabilityName::Translator => {
                let source = self.options.source_language.as_deref().unwrap_or("auto");
                let target = self.options.target_language.as_deref().unwrap_or("en");
                CapabilityOutput::Text(format!("[{}->{}] {}", source, target, text))
            }
            CapabilityName::Rewriter => CapabilityOutput::Text(collapse_whitespace(text)),
            CapabilityName::Writer | CapabilityName::LanguageModel => CapabilityOutput::Text(
                "Subject: Re: your message\n\nHi,\n\n\n\nThanks for the update. \
                 I will review it and follow up by the end of the week.\n\nBest regards"
                    .to_string(),
            ),
        };
        Ok(output)
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn detect(text: &str) -> Vec<DetectionResult> {
    let words = words(text);
    let total = words.len().max(1) as f64;
    let mut results: Vec<DetectionResult> = STOPWORDS
        .iter()
        .map(|(code, stopwords)| {
            let hits = words.iter().filter(|w| stopwords.contains(&w.as_str())).count();
            DetectionResult::new(*code, (hits as f64 * 3.0 / total).min(0.99))
        })
        .filter(|r| r.confidence >= 0.3)
        .collect();
    if results.is_empty() {
        results.push(DetectionResult::new("en", 0.9));
    }
    results
}

fn summarize(text: &str) -> String {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .map(|s| format!("* {}.", s))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// An open thread with one received message, a reply box under it and a
/// compose window on the side.
pub(crate) fn sample_page() -> Vec<Element> {
    let editor = |text: &str| {
        Element::new("div")
            .attr("role", "textbox")
            .attr("contenteditable", "true")
            .text(text)
    };

    let message = Element::new("div")
        .class("adn")
        .class("ads")
        .child(
            Element::new("div")
                .class("ha")
                .child(Element::new("h2").text("Q3 planning offsite")),
        )
        .child(
            Element::new("div").class("a3s").class("aiL").children([
                Element::new("div").text("Hi team,"),
                Element::new("div").text(
                    "The Q3 planning offsite moves to Thursday. Please send agenda items \
                     by Tuesday noon. Travel bookings go through the usual portal.",
                ),
                Element::new("div").text("Thanks, Dana"),
            ]),
        );

    let reply = Element::new("div")
        .class("ip")
        .class("iq")
        .child(editor(""));

    let compose = Element::new("div").class("M9").child(
        Element::new("div")
            .class("AD")
            .child(
                Element::new("input")
                    .attr("name", "subjectbox")
                    .attr("value", "Agenda items for the offsite"),
            )
            .child(editor("i think we   should cover hiring and the budget review")),
    );

    vec![message, reply, compose]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_defaults_to_english() {
        let results = detect("Please send the agenda by Tuesday.");
        assert_eq!(results[0].detected_language, "en");
    }

    #[test]
    fn test_detect_spanish() {
        let results = detect("Hola, gracias por la respuesta");
        assert_eq!(results[0].detected_language, "es");
        assert!(results[0].confidence > 0.5);
    }

    #[test]
    fn test_summarize_keeps_three_points() {
        let summary = summarize("One. Two! Three? Four.");
        assert_eq!(summary, "* One.\n* Two.\n* Three.");
    }

    #[tokio::test]
    async fn test_translator_uses_creation_languages() {
        let provider = DemoProvider;
        let options = CapabilityOptions::new().with_languages("es", "en");
        let instance = provider
            .create(CapabilityName::Translator, &options)
            .await
            .unwrap();

        let output = instance
            .invoke(CapabilityRequest::text("hola"))
            .await
            .unwrap();
        assert_eq!(output.into_text().unwrap(), "[es->en] hola");
    }

    #[test]
    fn test_sample_page_has_three_surfaces() {
        let page = sample_page();
        assert_eq!(page.len(), 3);
        assert!(page[1].has_class("ip"));
    }
}
