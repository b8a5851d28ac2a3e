//! # Mailmate Core
//!
//! The AI-capability side of Mailmate:
//!
//! - [`CapabilityRegistry`]: probes the provider and caches live instances
//! - [`InitializationCoordinator`]: per-context initialization state machine
//! - [`TabStateStore`] and [`BackgroundService`]: the coordination context
//! - [`channel`]: in-process message transport between contexts
//! - [`StatusMonitor`]: the status indicator's readiness client

pub mod background;
pub mod channel;
pub mod coordinator;
pub mod registry;
pub mod status;
pub mod tab_store;

pub use background::{BackgroundService, TabEvent, TabMessenger};
pub use channel::{ChannelTabMessenger, ContextEndpoint, ContextInbox, Envelope, context_channel};
pub use coordinator::{
    CoordinatorStatus, InitState, InitializationCoordinator, PortPublisher, RetryPolicy,
    StartOutcome, StatePublisher,
};
pub use registry::{CapabilityDefaults, CapabilityRegistry};
pub use status::{StatusIndicator, StatusMonitor};
pub use tab_store::TabStateStore;
