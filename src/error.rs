//! Error types for the TasteCheck client
//!
//! Every failure path in the client maps onto one of these variants. Validation errors are
//! raised before any network call; transport errors come from the single request boundary of
//! each flow.

use thiserror::Error;

/// TasteCheck client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TasteError {
    /// User input rejected before any network call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network failure or non-success response
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Response body could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Share card rasterization or export failed
    #[error("Share image error: {0}")]
    ShareError(String),

    /// Podcast audio decoding or playback failed
    #[error("Audio error: {0}")]
    AudioError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for TasteError {
    fn from(e: std::io::Error) -> Self {
        TasteError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for TasteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TasteError::DecodeError(e.to_string())
        } else {
            TasteError::TransportError(e.to_string())
        }
    }
}

impl From<base64::DecodeError> for TasteError {
    fn from(e: base64::DecodeError) -> Self {
        TasteError::DecodeError(e.to_string())
    }
}

impl TasteError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the flow retryable without re-entering input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TasteError::ValidationError(_) => true,
            TasteError::TransportError(_) => true,
            TasteError::DecodeError(_) => true,
            TasteError::ShareError(_) => true,
            TasteError::AudioError(_) => true,
            // Channel errors mean the controller thread is gone
            TasteError::ChannelError(_) => false,
            TasteError::IOError(_) => false,
            TasteError::ConfigError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    ///
    /// Validation messages are shown verbatim next to the offending input. Analysis
    /// failures deliberately collapse to one generic retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            TasteError::ValidationError(msg) => msg.clone(),
            TasteError::TransportError(_) | TasteError::DecodeError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            TasteError::ShareError(_) => "Failed - Try Again".to_string(),
            TasteError::AudioError(_) => "Audio failed".to_string(),
            TasteError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            TasteError::IOError(_) => "File system error occurred.".to_string(),
            TasteError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
        }
    }
}

/// Result type alias for TasteCheck operations
pub type Result<T> = std::result::Result<T, TasteError>;
