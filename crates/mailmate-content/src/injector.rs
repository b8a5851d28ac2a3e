//! Tool cluster construction and placement.

use mailmate_config::{Config, LanguageConfig, UiConfig};
use mailmate_protocols::InjectionError;
use tracing::debug;

use crate::actions::ActionId;
use crate::dom::{Document, Element, NodeId};
use crate::strategy::ExtractionStrategy;
use crate::surface::{AnchorKind, Placement, Surface, SurfaceKind};

/// Title shown on controls while the AI subsystem is not usable.
pub const UNAVAILABLE_TITLE: &str = "AI tools not available";

/// Attribute carrying the action of a control.
pub const TOOL_ID_ATTR: &str = "data-tool-id";

/// Attribute carrying the surface kind of a cluster.
pub const TYPE_ATTR: &str = "data-type";

/// Builds tool clusters and places them on surfaces.
pub struct ToolInjector {
    ui: UiConfig,
    languages: Vec<LanguageConfig>,
    default_target: String,
}

impl ToolInjector {
    pub fn new(
        ui: UiConfig,
        languages: Vec<LanguageConfig>,
        default_target: impl Into<String>,
    ) -> Self {
        Self {
            ui,
            languages,
            default_target: default_target.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ui.clone(),
            config.languages.clone(),
            config.capabilities.translator.default_target.clone(),
        )
    }

    pub fn ui(&self) -> &UiConfig {
        &self.ui
    }

    /// Controls offered on each surface kind.
    pub fn actions(kind: SurfaceKind) -> &'static [ActionId] {
        match kind {
            SurfaceKind::Compose => &[ActionId::Write, ActionId::Rewrite, ActionId::Translate],
            SurfaceKind::View => &[ActionId::Summarize, ActionId::Translate],
            SurfaceKind::Reply => &[ActionId::QuickResponse, ActionId::Translate],
        }
    }

    /// Anchor candidates in the order they are tried.
    pub fn anchors(kind: SurfaceKind) -> &'static [AnchorKind] {
        match kind {
            SurfaceKind::Compose => &[AnchorKind::BeforeEditor, AnchorKind::AppendToContainer],
            SurfaceKind::Reply => &[AnchorKind::BeforeEditor],
            SurfaceKind::View => &[
                AnchorKind::AfterHeader,
                AnchorKind::BeforeBody,
                AnchorKind::AppendToContainer,
            ],
        }
    }

    /// The control cluster for a surface kind. Does not touch any document.
    pub fn build_cluster(&self, kind: SurfaceKind, enabled: bool) -> Element {
        let buttons = Self::actions(kind).iter().map(|action| {
            let button = Element::new("button")
                .class(self.ui.button_class.as_str())
                .attr(TOOL_ID_ATTR, action.as_str())
                .text(action.label());
            self.with_availability(button, enabled)
        });

        let options = self.languages.iter().map(|language| {
            Element::new("option")
                .attr("value", language.code.as_str())
                .text(language.name.as_str())
        });
        let picker = Element::new("select")
            .class(self.ui.language_select_class.as_str())
            .attr("value", self.default_target.as_str())
            .children(options);

        Element::new("div")
            .class(self.ui.container_class.as_str())
            .attr(TYPE_ATTR, kind.as_str())
            .children(buttons)
            .child(self.with_availability(picker, enabled))
    }

    fn with_availability(&self, control: Element, enabled: bool) -> Element {
        if enabled {
            control
        } else {
            control
                .attr("disabled", "true")
                .attr("title", UNAVAILABLE_TITLE)
        }
    }

    /// Whether a cluster was already placed on `node`.
    pub fn is_marked(&self, doc: &Document, node: NodeId) -> bool {
        doc.has_attribute(node, &self.ui.marker_attribute)
    }

    /// Place a cluster on `surface` at the first anchor that resolves,
    /// then mark the surface.
    pub fn inject(
        &self,
        doc: &mut Document,
        strategy: &dyn ExtractionStrategy,
        surface: &Surface,
        enabled: bool,
    ) -> Result<NodeId, InjectionError> {
        if !doc.is_attached(surface.node) {
            return Err(InjectionError::Detached);
        }

        let resolved = Self::anchors(surface.kind).iter().find_map(|anchor| {
            strategy
                .resolve_anchor(doc, surface, *anchor)
                .filter(|placement| Self::can_place(doc, *placement))
                .map(|placement| (*anchor, placement))
        });

        // Materialize only once a placement is known; the arena never frees.
        if let Some((anchor, placement)) = resolved {
            let cluster = doc.create(&self.build_cluster(surface.kind, enabled));
            let placed = match placement {
                Placement::Before(reference) => doc.insert_before(reference, cluster),
                Placement::After(reference) => doc.insert_after(reference, cluster),
                Placement::Append(parent) => doc.append_child(parent, cluster),
            };
            if placed {
                doc.set_attribute(surface.node, &self.ui.marker_attribute, "true");
                debug!(
                    surface = %surface.kind,
                    node = %surface.node,
                    anchor = ?anchor,
                    "Injected tool cluster"
                );
                return Ok(cluster);
            }
        }

        Err(InjectionError::AnchorNotFound {
            surface: surface.kind.to_string(),
        })
    }

    /// Whether a fresh detached node could be inserted at `placement`.
    fn can_place(doc: &Document, placement: Placement) -> bool {
        match placement {
            Placement::Before(reference) | Placement::After(reference) => {
                doc.parent(reference).is_some()
            }
            Placement::Append(parent) => doc.is_attached(parent),
        }
    }

    /// Enable or disable every injected control. Controls with an action in
    /// flight are left alone. Returns how many controls changed.
    pub fn set_availability(&self, doc: &mut Document, usable: bool) -> usize {
        let controls: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|n| {
                (doc.has_class(*n, &self.ui.button_class)
                    || doc.has_class(*n, &self.ui.language_select_class))
                    && !doc.has_class(*n, &self.ui.loading_class)
            })
            .collect();

        let mut changed = 0;
        for control in controls {
            let disabled = doc.has_attribute(control, "disabled");
            if usable && disabled {
                doc.remove_attribute(control, "disabled");
                doc.remove_attribute(control, "title");
                changed += 1;
            } else if !usable && !disabled {
                doc.set_attribute(control, "disabled", "true");
                doc.set_attribute(control, "title", UNAVAILABLE_TITLE);
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "injector_tests.rs"]
mod tests;
