//! Structural predicates for the Gmail web client.

use crate::dom::{Document, NodeId, Selector, any_matches};
use crate::surface::{AnchorKind, Placement, Surface, SurfaceKind};

use super::ExtractionStrategy;
use super::cleaning::clean_email_text;

/// Gmail markup knowledge.
///
/// Class names are minified and change without notice, so every lookup
/// accepts a short list of alternatives.
pub struct GmailStrategy {
    compose: Vec<Selector>,
    reply: Vec<Selector>,
    view: Vec<Selector>,
    editor: Vec<Selector>,
    body: Vec<Selector>,
    header_container: Selector,
    header_fallback: Selector,
    quote: Selector,
    subject: Selector,
    compose_window: Selector,
}

impl GmailStrategy {
    pub fn new() -> Self {
        Self {
            compose: vec![Selector::class("AD"), Selector::attr("role", "dialog")],
            reply: vec![
                Selector::classes(&["ip", "iq"]),
                Selector::classes(&["gA", "gt"]),
            ],
            view: vec![Selector::classes(&["adn", "ads"])],
            editor: vec![
                Selector::attr("role", "textbox"),
                Selector::attr("contenteditable", "true"),
            ],
            body: vec![
                Selector::classes(&["a3s", "aiL"]),
                Selector::classes(&["ii", "gt"]),
            ],
            header_container: Selector::class("ha"),
            header_fallback: Selector::class("h7"),
            quote: Selector::class("gmail_quote"),
            subject: Selector::tag("input").and_attr("name", "subjectbox"),
            compose_window: Selector::class("M9"),
        }
    }

    fn selectors(&self, kind: SurfaceKind) -> &[Selector] {
        match kind {
            SurfaceKind::Compose => &self.compose,
            SurfaceKind::Reply => &self.reply,
            SurfaceKind::View => &self.view,
        }
    }

    fn first_within(&self, doc: &Document, root: NodeId, selectors: &[Selector]) -> Option<NodeId> {
        doc.descendants(root)
            .into_iter()
            .find(|n| any_matches(selectors, doc, *n))
    }

    fn body(&self, doc: &Document, surface: NodeId) -> Option<NodeId> {
        self.first_within(doc, surface, &self.body)
    }

    fn header(&self, doc: &Document, surface: NodeId) -> Option<NodeId> {
        doc.descendants(surface).into_iter().find(|n| {
            let in_header = doc.tag(*n) == "h2"
                && doc
                    .ancestors(*n)
                    .take_while(|a| *a != surface)
                    .any(|a| self.header_container.matches(doc, a));
            in_header || self.header_fallback.matches(doc, *n)
        })
    }

    fn cleaned(&self, text: &str) -> Option<String> {
        let cleaned = clean_email_text(text);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    /// The last message in the thread before the reply box.
    fn previous_message(&self, doc: &Document, reply: NodeId) -> Option<String> {
        let mut previous = None;
        for node in doc.descendants(doc.root()) {
            if node == reply {
                break;
            }
            if doc.contains(reply, node) || !any_matches(&self.view, doc, node) {
                continue;
            }
            let text = self
                .body(doc, node)
                .and_then(|b| self.cleaned(&doc.text_content(b)));
            if let Some(text) = text {
                previous = Some(text);
            }
        }

        previous.or_else(|| {
            doc.find(reply, &self.quote)
                .and_then(|q| self.cleaned(&doc.text_content(q)))
        })
    }
}

impl Default for GmailStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for GmailStrategy {
    fn name(&self) -> &str {
        "gmail"
    }

    fn matches(&self, doc: &Document, node: NodeId, kind: SurfaceKind) -> bool {
        let selectors = self.selectors(kind);
        // Outermost match wins so nested wrappers get one cluster.
        any_matches(selectors, doc, node)
            && !doc.ancestors(node).any(|a| any_matches(selectors, doc, a))
    }

    fn is_valid(&self, doc: &Document, surface: &Surface) -> bool {
        match surface.kind {
            SurfaceKind::Compose | SurfaceKind::Reply => self.editor(doc, surface).is_some(),
            SurfaceKind::View => self.body(doc, surface.node).is_some(),
        }
    }

    fn resolve_anchor(
        &self,
        doc: &Document,
        surface: &Surface,
        anchor: AnchorKind,
    ) -> Option<Placement> {
        match anchor {
            AnchorKind::AfterHeader => self.header(doc, surface.node).map(Placement::After),
            AnchorKind::BeforeBody => self.body(doc, surface.node).map(Placement::Before),
            AnchorKind::BeforeEditor => self.editor(doc, surface).map(Placement::Before),
            AnchorKind::AppendToContainer => Some(Placement::Append(surface.node)),
        }
    }

    fn editor(&self, doc: &Document, surface: &Surface) -> Option<NodeId> {
        self.first_within(doc, surface.node, &self.editor)
    }

    fn subject(&self, doc: &Document, surface: &Surface) -> Option<String> {
        let input = doc.find(surface.node, &self.subject).or_else(|| {
            doc.closest(surface.node, &self.compose_window)
                .and_then(|window| doc.find(window, &self.subject))
        })?;
        Some(doc.attribute(input, "value").unwrap_or("").trim().to_string())
    }

    fn extract_text(&self, doc: &Document, surface: &Surface) -> Option<String> {
        match surface.kind {
            SurfaceKind::Compose => {
                let text = doc.text_content(self.editor(doc, surface)?);
                (!text.is_empty()).then_some(text)
            }
            SurfaceKind::View => {
                let body = self.body(doc, surface.node)?;
                self.cleaned(&doc.text_content(body))
            }
            SurfaceKind::Reply => self.previous_message(doc, surface.node),
        }
    }
}

#[cfg(test)]
#[path = "gmail_tests.rs"]
mod tests;
