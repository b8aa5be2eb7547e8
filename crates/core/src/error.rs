//! Error types shared across the workspace.

use thiserror::Error;

/// Top-level error type for the viewer application.
#[derive(Error, Debug)]
pub enum Error {
    /// Graphics API errors surfaced outside the render core
    #[error("Graphics error: {0}")]
    Graphics(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Shader artifact loading errors
    #[error("Shader error: {0}")]
    Shader(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the workspace [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
