//! Classified capability errors.

use thiserror::Error;

use super::ProviderError;
use crate::capability::CapabilityName;

/// Substrings in provider messages that indicate throttling.
///
/// Best-effort only: the provider has no typed rate-limit signal.
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "resource_exhausted", "quota"];

const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout"];

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Capability unavailable: {0}")]
    Unavailable(CapabilityName),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Unknown(String),
}

impl CapabilityError {
    /// Classify a provider error by its shape and message.
    pub fn classify(error: ProviderError) -> Self {
        if let ProviderError::NotPresent(name) = error {
            return CapabilityError::Unavailable(name);
        }

        let message = error.message();
        let lowered = message.to_lowercase();
        if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
            CapabilityError::RateLimited(message)
        } else if TIMEOUT_MARKERS.iter().any(|m| lowered.contains(m)) {
            CapabilityError::Timeout(message)
        } else {
            CapabilityError::Unknown(error.to_string())
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CapabilityError::RateLimited(_))
    }
}

impl From<ProviderError> for CapabilityError {
    fn from(error: ProviderError) -> Self {
        Self::classify(error)
    }
}
