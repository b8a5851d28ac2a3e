//! Host-page knowledge: where surfaces are and how to read and write them.
//!
//! Everything markup-specific lives behind [`ExtractionStrategy`]; the
//! observer, injector and dispatcher only see [`Surface`]s, anchors and
//! text.

use std::collections::HashSet;

use mailmate_protocols::InjectionError;

use crate::dom::{Document, NodeId};
use crate::surface::{AnchorKind, Placement, Surface, SurfaceKind};

mod cleaning;
mod gmail;

pub use cleaning::clean_email_text;
pub use gmail::GmailStrategy;

/// Structural predicates and content access for one host page.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `node` is a surface of `kind`.
    fn matches(&self, doc: &Document, node: NodeId, kind: SurfaceKind) -> bool;

    /// Type-specific validity, e.g. a compose surface needs an editor.
    fn is_valid(&self, doc: &Document, surface: &Surface) -> bool;

    fn resolve_anchor(
        &self,
        doc: &Document,
        surface: &Surface,
        anchor: AnchorKind,
    ) -> Option<Placement>;

    /// The editable text region of a compose or reply surface.
    fn editor(&self, doc: &Document, surface: &Surface) -> Option<NodeId>;

    /// Subject of a compose surface.
    fn subject(&self, doc: &Document, surface: &Surface) -> Option<String>;

    /// Source text for an action on `surface`, cleaned.
    fn extract_text(&self, doc: &Document, surface: &Surface) -> Option<String>;

    /// Replace the editor content of `surface`.
    fn write_text(
        &self,
        doc: &mut Document,
        surface: &Surface,
        text: &str,
    ) -> Result<(), InjectionError> {
        let editor = self.editor(doc, surface).ok_or_else(|| {
            InjectionError::InvalidSurface(format!("{} has no editor", surface.kind))
        })?;
        doc.set_text(editor, text);
        Ok(())
    }

    /// Every surface on the page, in matcher priority order.
    ///
    /// A node claimed by an earlier matcher is not offered to later ones.
    fn locate_surfaces(&self, doc: &Document) -> Vec<Surface> {
        let nodes = doc.descendants(doc.root());
        let mut claimed = HashSet::new();
        let mut surfaces = Vec::new();

        for kind in SurfaceKind::PRIORITY {
            for node in &nodes {
                if claimed.contains(node) {
                    continue;
                }
                if self.matches(doc, *node, kind) {
                    claimed.insert(*node);
                    surfaces.push(Surface::new(kind, *node));
                }
            }
        }
        surfaces
    }
}
