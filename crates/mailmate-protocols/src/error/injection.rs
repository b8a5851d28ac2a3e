//! Tool injection errors. Logged only, never shown to the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("No anchor found for {surface} surface")]
    AnchorNotFound { surface: String },

    #[error("Surface node is no longer attached")]
    Detached,

    #[error("Invalid surface: {0}")]
    InvalidSurface(String),
}
