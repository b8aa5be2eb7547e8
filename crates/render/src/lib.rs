//! GPU frame-rendering core.
//!
//! This crate owns the whole per-frame protocol:
//! - [`context::DeviceContext`] - adapter, device, direct queue, shared
//!   command pool, frame fence
//! - [`presentation::PresentationSurface`] - swap chain, back-buffer
//!   ring, depth buffer
//! - [`sync::FrameSynchronizer`] - the single CPU/GPU rendezvous point
//! - [`orchestrator::FrameOrchestrator`] - begin/mid/end command-list
//!   stages bracketing per-pipeline work
//! - [`mesh::MeshPipeline`] - one drawable's complete GPU representation
//! - [`renderer::Renderer`] - the update/render driving surface
//!
//! The frame loop is fully serialized: one CPU thread records and
//! submits, then blocks on the frame fence until the GPU drains. That
//! single suspension point is what makes the shared command pool reset
//! and the unsynchronized constant-buffer write legal.

pub mod camera;
pub mod constants;
pub mod context;
pub mod depth;
mod error;
pub mod mesh;
pub mod mesh_data;
pub mod orchestrator;
pub mod overlay;
pub mod presentation;
pub mod renderer;
pub mod sync;

pub use error::{RenderError, RenderResult};
pub use renderer::Renderer;

// Re-exported so collaborators can describe pipelines without a direct
// rhi dependency
pub use vantage_rhi::vertex::VertexLayout;
