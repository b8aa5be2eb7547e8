//! Render-core error types.

use thiserror::Error;

use vantage_rhi::RhiError;

/// Error type for the render core.
///
/// Setup errors abort construction (the renderer value never exists in a
/// partial state); per-frame errors abort the frame and request process
/// termination. There is no automatic retry on either path.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Error surfaced by the RHI layer
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// Raw Vulkan error from acquire/present paths
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vantage_rhi::vk::Result),

    /// Window/surface binding error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Frame protocol violation (ordering, indices, state transitions)
    #[error("Frame error: {0}")]
    Frame(String),
}

/// Result type alias for render-core operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
