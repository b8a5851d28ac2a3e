//! Cross-context communication errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("No receiver listening: {0}")]
    NoReceiver(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Response dropped before it was sent")]
    ResponseDropped,

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_receiver() {
        let err = MessageError::NoReceiver("tab 7".to_string());
        assert!(err.to_string().contains("tab 7"));
    }

    #[test]
    fn test_serialization_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = MessageError::from(json_err);
        assert!(err.to_string().contains("Serialization"));
    }
}
