use thiserror::Error;

/// Domain-level error taxonomy
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No pending record for the given gateway payment id
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Wallet owner missing at credit time
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Illegal lifecycle transition
    #[error("Invalid payment state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Conditional completion matched no pending row; another delivery won
    #[error("Payment already processed: {0}")]
    AlreadyProcessed(String),

    /// Non-positive or otherwise unusable amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// bKash API error
    #[error("bKash API error: {0}")]
    BkashError(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
