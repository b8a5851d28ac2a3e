//! Capability provider errors.

use thiserror::Error;

use crate::capability::CapabilityName;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Capability not present on provider: {0}")]
    NotPresent(CapabilityName),

    #[error("Failed to create {capability}: {message}")]
    CreateFailed {
        capability: CapabilityName,
        message: String,
    },

    #[error("Invocation failed: {0}")]
    InvokeFailed(String),

    #[error("Unexpected output, expected {expected}")]
    UnexpectedOutput { expected: &'static str },

    #[error("Destroy failed: {0}")]
    DestroyFailed(String),
}

impl ProviderError {
    /// The provider-supplied message, used for error-shape heuristics.
    pub fn message(&self) -> String {
        match self {
            ProviderError::CreateFailed { message, .. } => message.clone(),
            ProviderError::InvokeFailed(message) | ProviderError::DestroyFailed(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
