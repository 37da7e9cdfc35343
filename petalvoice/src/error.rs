//! Error types for PetalVoice

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetalVoiceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Playback device error: {0}")]
    Device(String),

    #[error("Event source error: {0}")]
    EventSource(String),

    #[error("Malformed {action} action: {reason}")]
    MalformedAction {
        action: &'static str,
        reason: String,
    },

    #[error("World is not initialized")]
    NotInitialized,

    #[error("Event \"{0}\" not found")]
    EventNotFound(String),

    #[error("Event bank is already loaded")]
    BankAlreadyLoaded,
}

impl PetalVoiceError {
    pub(crate) fn malformed(action: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedAction {
            action,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PetalVoiceError>;
