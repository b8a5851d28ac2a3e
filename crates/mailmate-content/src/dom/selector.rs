//! Structural node predicates.

use super::{Document, NodeId};

/// A conjunction of tag, class and attribute tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self::default().and_class(class)
    }

    /// Every listed class must be present.
    pub fn classes(classes: &[&str]) -> Self {
        classes
            .iter()
            .fold(Self::default(), |selector, class| selector.and_class(class))
    }

    /// Attribute equal to `value`.
    pub fn attr(name: &str, value: &str) -> Self {
        Self::default().and_attr(name, value)
    }

    /// Attribute present with any value.
    pub fn has_attr(name: &str) -> Self {
        Self {
            attributes: vec![(name.to_string(), None)],
            ..Default::default()
        }
    }

    pub fn and_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn and_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .push((name.to_string(), Some(value.to_string())));
        self
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(node) != tag.as_str() {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|(name, expected)| match (doc.attribute(node, name), expected) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
    }
}

/// True if any selector matches.
pub fn any_matches(selectors: &[Selector], doc: &Document, node: NodeId) -> bool {
    selectors.iter().any(|s| s.matches(doc, node))
}
