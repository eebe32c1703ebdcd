/// Unified error types for GroupWarden
use thiserror::Error;

/// Main error type for the moderation engine
#[derive(Error, Debug)]
pub enum WardenError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Chat gateway errors (request rejected, member unresolvable, transport down)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Settings document (de)serialization errors
    #[error("Settings document error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for the moderation engine
pub type WardenResult<T> = Result<T, WardenError>;
