//! Capability provider traits.
//!
//! The provider is the on-device AI engine. It is treated as unreliable:
//! it may be absent, may lack individual capabilities, and may fail any
//! call with an error whose message is the only hint of rate limiting.

use async_trait::async_trait;

use crate::capability::{CapabilityName, CapabilityOptions, CapabilityOutput, CapabilityRequest};
use crate::error::ProviderError;

/// The on-device AI engine.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Whether the provider exposes the capability at all.
    fn exposes(&self, name: CapabilityName) -> bool;

    /// Create an instance of a capability.
    async fn create(
        &self,
        name: CapabilityName,
        options: &CapabilityOptions,
    ) -> Result<Box<dyn CapabilityInstance>, ProviderError>;

    /// Create a throwaway instance to test availability.
    async fn probe(
        &self,
        name: CapabilityName,
        options: &CapabilityOptions,
    ) -> Result<Box<dyn CapabilityInstance>, ProviderError> {
        if !self.exposes(name) {
            return Err(ProviderError::NotPresent(name));
        }
        self.create(name, options).await
    }
}

/// A live capability handle.
#[async_trait]
pub trait CapabilityInstance: Send + Sync {
    /// The capability this instance serves.
    fn capability(&self) -> CapabilityName;

    /// Run the capability once.
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, ProviderError>;

    /// Release provider resources. Optional.
    async fn destroy(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
