//! # Mailmate Protocols
//!
//! Shared vocabulary for the Mailmate workspace. Contains only types,
//! traits and error definitions - no behaviour beyond small helpers.
//!
//! ## Core Traits
//!
//! - [`CapabilityProvider`] - The on-device AI engine, consumed as an opaque collaborator
//! - [`CapabilityInstance`] - A live handle for one capability created with options
//! - [`MessagePort`] - One-shot request/response between browser contexts
//!
//! ## Data
//!
//! - [`CapabilityMap`] - Availability of the six known capabilities
//! - [`TabState`] - Per-tab record owned by the coordination context
//! - [`Message`] - The cross-context message protocol

pub mod capability;
pub mod error;
pub mod message;
pub mod provider;
pub mod tab;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use capability::{
    CapabilityMap, CapabilityName, CapabilityOptions, CapabilityOutput, CapabilityRequest,
    DetectionResult,
};
pub use error::{ActionError, CapabilityError, InjectionError, MessageError, ProviderError};
pub use message::{Message, MessagePort, MessageSender};
pub use provider::{CapabilityInstance, CapabilityProvider};
pub use tab::{TabId, TabState, TabStateUpdate};
