//! Error types for Clinassist
//!
//! One error enum is shared by the quota governor, the resilient call
//! wrapper and the rankers. Terminal errors carry stable, human-readable
//! messages so a UI layer can show them without inspecting variants.

use thiserror::Error;

/// Message shown when rate-limit retries are exhausted
pub const RATE_LIMITED_MESSAGE: &str =
    "The AI service is receiving too many requests right now. Please wait a minute and try again.";

/// Message shown when overload retries are exhausted
pub const OVERLOADED_MESSAGE: &str =
    "The AI service is temporarily overloaded due to high demand. Please try again in a few moments.";

/// Main error type for the Clinassist services
#[derive(Error, Debug)]
pub enum ClinicalError {
    /// Daily quota exhausted; never retried
    #[error("{reason}")]
    QuotaExceeded { reason: String },

    /// Rate-limit retries exhausted; circuit breaker is now open
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,

    /// Overload retries exhausted
    #[error("{}", OVERLOADED_MESSAGE)]
    ServiceOverloaded,

    /// Error raised by a wrapped remote operation
    #[error("{0}")]
    Upstream(String),

    /// Quota persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for Clinassist operations
pub type Result<T> = std::result::Result<T, ClinicalError>;

/// Store errors are `anyhow` chains; keep the whole chain in the message
impl From<anyhow::Error> for ClinicalError {
    fn from(err: anyhow::Error) -> Self {
        ClinicalError::Storage(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_display_is_reason() {
        let err = ClinicalError::QuotaExceeded {
            reason: "Daily API quota reached (1500/1500 calls).".to_string(),
        };
        assert_eq!(err.to_string(), "Daily API quota reached (1500/1500 calls).");
    }

    #[test]
    fn test_fixed_messages_hide_provider_text() {
        assert_eq!(ClinicalError::RateLimited.to_string(), RATE_LIMITED_MESSAGE);
        assert_eq!(ClinicalError::ServiceOverloaded.to_string(), OVERLOADED_MESSAGE);
        assert!(!RATE_LIMITED_MESSAGE.contains("429"));
        assert!(!OVERLOADED_MESSAGE.contains("503"));
    }

    #[test]
    fn test_anyhow_chain_becomes_storage_error() {
        let err: ClinicalError = anyhow::anyhow!("disk full")
            .context("Failed to write quota file")
            .into();
        match err {
            ClinicalError::Storage(message) => {
                assert_eq!(message, "Failed to write quota file: disk full")
            }
            other => panic!("Expected Storage, got {:?}", other),
        }
    }

    #[test]
    fn test_upstream_passes_message_through() {
        let err = ClinicalError::Upstream("bad input".to_string());
        assert_eq!(err.to_string(), "bad input");
    }
}
