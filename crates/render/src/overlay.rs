//! Overlay UI seam.
//!
//! The overlay widget system is an external collaborator. Its draw data
//! is consumed inside the EndFrame stage: the orchestrator opens the
//! closing command list, binds the back-buffer and depth views, and
//! hands the collaborator an [`OverlayContext`] to record into. The
//! render core never interprets the overlay's contents.

use std::sync::Arc;

use vantage_rhi::command::CommandBuffer;
use vantage_rhi::device::Device;
use vantage_rhi::vk;

/// Recording context handed to the overlay collaborator during EndFrame.
///
/// Exposes the open command list, the currently bound render-target and
/// depth views, and the surface extent - everything the overlay needs to
/// emit its own draws on top of the frame.
pub struct OverlayContext<'a> {
    /// The end-stage command list, open and inside an attachment pass.
    pub cmd: &'a CommandBuffer,
    /// View of the back buffer being composited into.
    pub color_view: vk::ImageView,
    /// View of the frame's depth buffer.
    pub depth_view: vk::ImageView,
    /// Surface pixel size; overlay geometry maps 1:1 to these pixels.
    pub extent: vk::Extent2D,
    /// Device access for overlay-owned resources.
    pub device: &'a Arc<Device>,
}

/// External overlay collaborator contract.
pub trait OverlayRenderer {
    /// Records the overlay's pre-built draw commands into the frame's
    /// closing list. Called once per frame, between the render-target
    /// binding and the presentation transition.
    fn record(&mut self, ctx: &mut OverlayContext<'_>);
}

/// Default collaborator that draws nothing.
pub struct NoOverlay;

impl OverlayRenderer for NoOverlay {
    fn record(&mut self, _ctx: &mut OverlayContext<'_>) {}
}
