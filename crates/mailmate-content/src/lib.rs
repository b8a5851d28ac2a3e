//! # Mailmate Content
//!
//! The content context of a mail tab:
//!
//! - [`dom`]: arena page model with a mutation queue
//! - [`ExtractionStrategy`]: host-page knowledge, with [`GmailStrategy`]
//! - [`DomObserverEngine`]: throttled scanning for tool surfaces
//! - [`ToolInjector`]: builds and places tool clusters
//! - [`ToolActionDispatcher`]: runs tool actions against the capability registry
//! - [`ContentScript`]: ties the above to the runtime message protocol

pub mod actions;
pub mod content_script;
pub mod dispatcher;
pub mod dom;
pub mod injector;
pub mod observer;
pub mod strategy;
pub mod surface;

#[cfg(test)]
mod fixtures;

pub use actions::{ActionId, ToolActionRequest};
pub use content_script::ContentScript;
pub use dispatcher::{SurfaceContext, ToolActionDispatcher};
pub use dom::{Document, Element, Mutation, NodeId, Selector, SharedDocument};
pub use injector::ToolInjector;
pub use observer::{DomObserverEngine, ScanReport};
pub use strategy::{ExtractionStrategy, GmailStrategy, clean_email_text};
pub use surface::{AnchorKind, Placement, Surface, SurfaceKind};
