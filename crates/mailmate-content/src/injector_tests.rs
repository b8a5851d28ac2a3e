use super::*;
use crate::dom::{Document, Selector};
use crate::fixtures::{editor, reply_box, view_message};
use crate::strategy::GmailStrategy;

fn injector() -> ToolInjector {
    ToolInjector::from_config(&Config::default())
}

fn tool_ids(element: &Element) -> Vec<String> {
    let mut ids = Vec::new();
    for child in &element.children {
        if let Some(id) = child.attribute(TOOL_ID_ATTR) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[test]
fn test_cluster_controls_per_kind() {
    let injector = injector();
    assert_eq!(
        tool_ids(&injector.build_cluster(SurfaceKind::Compose, true)),
        vec!["write", "rewrite", "translate"]
    );
    assert_eq!(
        tool_ids(&injector.build_cluster(SurfaceKind::View, true)),
        vec!["summarize", "translate"]
    );
    assert_eq!(
        tool_ids(&injector.build_cluster(SurfaceKind::Reply, true)),
        vec!["quick-response", "translate"]
    );
}

#[test]
fn test_cluster_carries_type_and_picker() {
    let cluster = injector().build_cluster(SurfaceKind::View, true);
    assert_eq!(cluster.attribute(TYPE_ATTR), Some("view"));
    assert!(cluster.has_class("mailmate-tools-container"));

    let picker = cluster.find(&|e| e.has_class("language-select")).unwrap();
    assert_eq!(picker.attribute("value"), Some("en"));
    assert_eq!(picker.children.len(), Config::default().languages.len());
}

#[test]
fn test_disabled_cluster() {
    let cluster = injector().build_cluster(SurfaceKind::Compose, false);
    let disabled = cluster.count(&|e| e.attribute("disabled") == Some("true"));
    assert_eq!(disabled, 4);
    let button = cluster.find(&|e| e.has_class("ai-tool-button")).unwrap();
    assert_eq!(button.attribute("title"), Some(UNAVAILABLE_TITLE));
}

#[test]
fn test_view_injects_after_header_and_marks() {
    let mut doc = Document::new("https://mail.google.com/");
    let root = doc.root();
    let node = doc.append(root, &view_message("Budget", "Numbers attached."));
    let surface = Surface::new(SurfaceKind::View, node);
    let injector = injector();

    let cluster = injector
        .inject(&mut doc, &GmailStrategy::new(), &surface, true)
        .unwrap();
    assert!(injector.is_marked(&doc, node));
    assert_eq!(doc.parent(cluster), Some(doc.find(node, &Selector::class("ha")).unwrap()));
}

#[test]
fn test_view_falls_back_to_body_anchor() {
    let mut doc = Document::new("https://mail.google.com/");
    let root = doc.root();
    let node = doc.append(
        root,
        &Element::new("div")
            .class("adn")
            .class("ads")
            .child(Element::new("div").class("a3s").class("aiL").text("Body")),
    );
    let surface = Surface::new(SurfaceKind::View, node);

    let cluster = injector()
        .inject(&mut doc, &GmailStrategy::new(), &surface, true)
        .unwrap();
    assert_eq!(doc.children(node)[0], cluster);
}

#[test]
fn test_reply_goes_before_editor() {
    let mut doc = Document::new("https://mail.google.com/");
    let root = doc.root();
    let node = doc.append(root, &reply_box("draft"));
    let surface = Surface::new(SurfaceKind::Reply, node);

    let cluster = injector()
        .inject(&mut doc, &GmailStrategy::new(), &surface, true)
        .unwrap();
    let children = doc.children(node);
    assert_eq!(children[0], cluster);
    assert_eq!(doc.attribute(children[1], "role"), Some("textbox"));
}

#[test]
fn test_reply_without_editor_stays_unmarked() {
    let mut doc = Document::new("https://mail.google.com/");
    let root = doc.root();
    let node = doc.append(root, &Element::new("div").class("ip").class("iq"));
    let surface = Surface::new(SurfaceKind::Reply, node);
    let injector = injector();
    let nodes = doc.node_count();

    let err = injector
        .inject(&mut doc, &GmailStrategy::new(), &surface, true)
        .unwrap_err();
    assert!(matches!(err, InjectionError::AnchorNotFound { .. }));
    assert!(!injector.is_marked(&doc, node));
    assert_eq!(doc.node_count(), nodes);
}

#[test]
fn test_detached_surface_rejected() {
    let mut doc = Document::new("https://mail.google.com/");
    let node = doc.create(&reply_box(""));
    let err = injector()
        .inject(
            &mut doc,
            &GmailStrategy::new(),
            &Surface::new(SurfaceKind::Reply, node),
            true,
        )
        .unwrap_err();
    assert!(matches!(err, InjectionError::Detached));
}

#[test]
fn test_set_availability_toggles_and_skips_loading() {
    let mut doc = Document::new("https://mail.google.com/");
    let root = doc.root();
    let node = doc.append(root, &Element::new("div").class("AD").child(editor("")));
    let injector = injector();
    injector
        .inject(
            &mut doc,
            &GmailStrategy::new(),
            &Surface::new(SurfaceKind::Compose, node),
            false,
        )
        .unwrap();

    let busy = doc.find(root, &Selector::attr(TOOL_ID_ATTR, "rewrite")).unwrap();
    doc.add_class(busy, "loading");

    assert_eq!(injector.set_availability(&mut doc, true), 3);
    assert!(doc.has_attribute(busy, "disabled"));
    let write = doc.find(root, &Selector::attr(TOOL_ID_ATTR, "write")).unwrap();
    assert!(!doc.has_attribute(write, "disabled"));
    assert!(!doc.has_attribute(write, "title"));

    assert_eq!(injector.set_availability(&mut doc, true), 0);
    assert_eq!(injector.set_availability(&mut doc, false), 3);
}
