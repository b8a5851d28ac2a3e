//! Error types for the Mailmate protocol layer.

mod action;
mod capability;
mod injection;
mod message;
mod provider;

pub use action::*;
pub use capability::*;
pub use injection::*;
pub use message::*;
pub use provider::*;
