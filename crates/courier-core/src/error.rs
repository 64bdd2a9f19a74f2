use thiserror::Error;

/// Top-level error type for Courier.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Error from the session controller or queue.
    #[error("session error: {0}")]
    Session(String),

    /// Error from the remote contact store.
    #[error("crm error: {0}")]
    Crm(String),

    /// The remote store rejected the credential. Kept separate from
    /// `Crm` so callers can stop a lookup instead of trying further
    /// candidates with a dead token.
    #[error("crm credential rejected")]
    Unauthorized,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
