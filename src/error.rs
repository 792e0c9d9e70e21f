//! Error types for the geosearch application layer.

use geosearch_core::SearchError;

/// Top-level error type for configuration loading and CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be parsed, serialized or validated.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Routing engine error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Invalid command-line argument.
    #[error("invalid argument: {0}")]
    Argument(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
