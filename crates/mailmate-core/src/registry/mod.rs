//! Capability availability and instance cache.

mod capability;
mod defaults;

pub use capability::CapabilityRegistry;
pub use defaults::CapabilityDefaults;
