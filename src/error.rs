//! Error types for Haggle

use thiserror::Error;

/// Main error type for Haggle
#[derive(Error, Debug)]
pub enum HaggleError {
    // Buyer input errors
    #[error("Invalid counter-offer: {0}")]
    InvalidCounterOffer(String),

    // Negotiation errors
    #[error("Invalid negotiation state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Seller is still thinking, input ignored")]
    TransitionPending,

    #[error("Negotiation already finished")]
    SessionFinished,

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HaggleError {
    /// Whether the front end should simply re-prompt the buyer
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HaggleError::InvalidCounterOffer(_)
                | HaggleError::TransitionPending
                | HaggleError::InvalidStateTransition(_)
        )
    }
}

/// Result type alias for Haggle operations
pub type Result<T> = std::result::Result<T, HaggleError>;
