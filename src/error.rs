//! Error types for the document registration client.

use thiserror::Error;

/// Main error type for crpt-api operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Limiter or client settings that can never work
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The wait for admission was interrupted before a slot was reserved
    #[error("Admission cancelled before a slot was reserved")]
    Cancelled,

    /// The endpoint answered with something other than 200 OK
    #[error("Remote endpoint rejected the document: HTTP {status}")]
    RemoteRejected { status: u16 },

    /// Network-level fault while talking to the endpoint
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] reqwest::Error),

    /// Document could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller-supplied argument rejected before admission
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for crpt-api operations.
pub type Result<T> = std::result::Result<T, CrptError>;
