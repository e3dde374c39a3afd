//! Error types for driftwatch-core

use thiserror::Error;

/// Main error type for the driftwatch-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Project not found
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Recommendation not found
    #[error("recommendation not found: {0}")]
    RecommendationNotFound(String),

    /// Status change not allowed from the recommendation's current status
    #[error("recommendation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// Malformed classified commit record in an import file
    #[error("import error at record {line}: {message}")]
    Import { line: usize, message: String },
}

/// Result type alias for driftwatch-core
pub type Result<T> = std::result::Result<T, Error>;
