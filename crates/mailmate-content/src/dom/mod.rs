//! Arena-backed page model.
//!
//! The document owns every node it ever created; removed nodes stay in
//! the arena, detached. Changes to attached nodes are queued as
//! [`Mutation`] records and drained in batches, the way a mutation
//! observer delivers them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

mod element;
mod selector;

pub use element::Element;
pub use selector::{Selector, any_matches};

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;

/// Document shared between the content context's tasks.
///
/// Never hold the lock across an `.await`.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Handle to a node of one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
    CharacterData {
        target: NodeId,
    },
}

impl Mutation {
    /// Added nodes or changed attributes.
    pub fn is_relevant(&self) -> bool {
        match self {
            Mutation::ChildList { added, .. } => !added.is_empty(),
            Mutation::Attributes { .. } => true,
            Mutation::CharacterData { .. } => false,
        }
    }
}

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "blockquote", "tr", "table",
];

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The host page.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    url: String,
    pending: Vec<Mutation>,
}

impl Document {
    /// An empty page whose root is a `body` element.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData::new("body")],
            root: NodeId(0),
            url: url.into(),
            pending: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    /// Nodes ever created, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// In-page navigation. Does not touch the tree.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    // ---- construction ----

    /// Materialize a detached subtree.
    pub fn create(&mut self, element: &Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut data = NodeData::new(&element.tag);
        data.classes = element.classes.clone();
        data.attributes = element.attributes.clone();
        data.text = element.text.clone();
        self.nodes.push(data);

        for child in &element.children {
            let child_id = self.create(child);
            if let Some(child_data) = self.nodes.get_mut(child_id.0) {
                child_data.parent = Some(id);
            }
            if let Some(data) = self.nodes.get_mut(id.0) {
                data.children.push(child_id);
            }
        }
        id
    }

    /// Materialize `element` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: &Element) -> NodeId {
        let id = self.create(element);
        self.append_child(parent, id);
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_at(parent, child, None)
    }

    /// Insert `child` as the previous sibling of `reference`.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let index = self.children(parent).iter().position(|c| *c == reference);
        self.insert_at(parent, child, index)
    }

    /// Insert `child` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == reference)
            .map(|i| i + 1);
        self.insert_at(parent, child, index)
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> bool {
        if parent == child || self.contains(child, parent) || self.nodes.get(parent.0).is_none() {
            return false;
        }
        self.detach(child);

        let Some(data) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        match index {
            Some(index) if index <= data.children.len() => data.children.insert(index, child),
            _ => data.children.push(child),
        }
        if let Some(child_data) = self.nodes.get_mut(child.0) {
            child_data.parent = Some(parent);
        }

        self.record(
            parent,
            Mutation::ChildList {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            },
        );
        true
    }

    /// Detach a node from its parent.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(parent.0) {
            data.children.retain(|c| *c != node);
        }
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.parent = None;
        }
        self.record(
            parent,
            Mutation::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            },
        );
    }

    // ---- attributes and text ----

    pub fn tag(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let changed = match self.nodes.get_mut(node.0) {
            Some(data) => data.attributes.insert(name.to_string(), value.clone()) != Some(value),
            None => false,
        };
        if changed {
            self.record_attribute(node, name);
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let removed = self
            .nodes
            .get_mut(node.0)
            .is_some_and(|data| data.attributes.remove(name).is_some());
        if removed {
            self.record_attribute(node, name);
        }
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.nodes
            .get(node.0)
            .map(|n| n.classes.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let added = match self.nodes.get_mut(node.0) {
            Some(data) if !data.classes.iter().any(|c| c == class) => {
                data.classes.push(class.to_string());
                true
            }
            _ => false,
        };
        if added {
            self.record_attribute(node, "class");
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let removed = match self.nodes.get_mut(node.0) {
            Some(data) => {
                let before = data.classes.len();
                data.classes.retain(|c| c != class);
                data.classes.len() != before
            }
            None => false,
        };
        if removed {
            self.record_attribute(node, "class");
        }
    }

    /// Text owned by the node itself, children excluded.
    pub fn own_text(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map(|n| n.text.as_str()).unwrap_or("")
    }

    /// Replace the node's content with plain text.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        for child in self.children(node).to_vec() {
            self.detach(child);
        }
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.text = text.into();
        }
        self.record(node, Mutation::CharacterData { target: node });
    }

    /// Rendered text of the subtree. Block elements start on a new line.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(node.0) else {
            return;
        };
        let block = BLOCK_TAGS.contains(&data.tag.as_str());
        if block && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&data.text);
        for child in &data.children {
            self.collect_text(*child, out);
        }
        if block && !out.ends_with('\n') {
            out.push('\n');
        }
    }

    // ---- traversal ----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.contains(self.root, node)
    }

    /// Whether `node` is a strict descendant of `ancestor`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    /// Strict descendants in document order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// First strict descendant matching `selector`.
    pub fn find(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    pub fn find_all(&self, node: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|n| selector.matches(self, *n))
    }

    // ---- mutation queue ----

    fn record(&mut self, target: NodeId, mutation: Mutation) {
        if self.is_attached(target) {
            self.pending.push(mutation);
        }
    }

    fn record_attribute(&mut self, node: NodeId, name: &str) {
        self.record(
            node,
            Mutation::Attributes {
                target: node,
                name: name.to_string(),
            },
        );
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the queued mutation batch.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.pending)
    }
}
