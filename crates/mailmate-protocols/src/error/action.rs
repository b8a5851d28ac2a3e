//! Tool action errors, rendered into the output region.

use thiserror::Error;

use super::CapabilityError;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No email content found")]
    NoContentFound,

    #[error("AI operation timed out after {0} seconds")]
    OperationTimedOut(u64),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("Source and target languages are the same ({0})")]
    SameLanguage(String),

    #[error("Could not detect source language")]
    DetectionFailed,

    #[error("No valid result from AI model")]
    EmptyResult,

    #[error("Control is busy")]
    ControlBusy,

    #[error("Result discarded, request is no longer current")]
    Superseded,

    #[error("Tool surface is no longer attached")]
    SurfaceDetached,
}

impl ActionError {
    /// Human-readable text for the output region.
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Capability(CapabilityError::RateLimited(_)) => {
                "Rate limit exceeded. Please try again later.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityName;

    #[test]
    fn test_rate_limited_user_message() {
        let err = ActionError::from(CapabilityError::RateLimited("quota".into()));
        assert_eq!(
            err.user_message(),
            "Rate limit exceeded. Please try again later."
        );
    }

    #[test]
    fn test_timeout_user_message() {
        let err = ActionError::OperationTimedOut(30);
        assert_eq!(err.user_message(), "Error: AI operation timed out after 30 seconds");
    }

    #[test]
    fn test_unavailable_passes_through() {
        let err = ActionError::from(CapabilityError::Unavailable(CapabilityName::Summarizer));
        assert!(err.user_message().contains("summarizer"));
    }

    #[test]
    fn test_same_language() {
        let err = ActionError::SameLanguage("en".into());
        assert!(err.to_string().contains("same"));
    }
}
