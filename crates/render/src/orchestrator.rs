//! Frame orchestration.
//!
//! Three command-list stages bracket every frame, always in this order,
//! never skipped:
//!
//! 1. **BeginFrame** - recycle the shared command allocator (legal only
//!    because the synchronizer confirmed the previous frame retired),
//!    transition the back buffer from presentation state to
//!    render-target state, clear color and depth.
//! 2. **MidFrame** - reserved seam for cross-pipeline dependencies;
//!    contributes nothing when no such dependency exists.
//! 3. **EndFrame** - re-bind the render targets, record the external
//!    overlay's draws, transition the back buffer back to presentation
//!    state.
//!
//! Between stages 1 and 3, each active pipeline populates its own list
//! against the same render-target binding. The assembled sequence
//! `[begin, pipeline.., end]` is submitted as one atomic batch; the
//! ordering is load-bearing and enforced by [`FrameSubmission`].
//!
//! The orchestrator is the sole mutator of back-buffer resource state.

use tracing::debug;

use vantage_rhi::command::CommandBuffer;
use vantage_rhi::vk;

use crate::context::DeviceContext;
use crate::error::{RenderError, RenderResult};
use crate::overlay::{OverlayContext, OverlayRenderer};
use crate::presentation::PresentationSurface;

/// Which stage a command list belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    /// The opening list: allocator recycle, transitions, clears.
    Begin,
    /// A rendering pipeline's list.
    Pipeline,
    /// The closing list: overlay, presentation transition.
    End,
}

/// Logical back-buffer resource state.
///
/// The image is explicitly transitioned before and after use; the
/// orchestrator owns every transition and two consecutive same-state
/// transitions are a protocol violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackBufferState {
    /// Presentable; the presentation engine may read it.
    Present,
    /// Bound as a render target; pipelines may write it.
    RenderTarget,
}

/// Per-image resource state tracker.
#[derive(Clone, Debug)]
pub struct ResourceStateTracker {
    states: Vec<BackBufferState>,
}

impl ResourceStateTracker {
    /// All images start in the presentable state.
    pub fn new(image_count: u32) -> Self {
        Self {
            states: vec![BackBufferState::Present; image_count as usize],
        }
    }

    /// Returns the tracked state of image `index`.
    pub fn state(&self, index: u32) -> BackBufferState {
        self.states[index as usize]
    }

    /// Records a transition of image `index` to `to`.
    ///
    /// # Errors
    ///
    /// Rejects same-state transitions; a Present→Present or
    /// RenderTarget→RenderTarget sequence means a stage was skipped or
    /// repeated.
    pub fn transition(&mut self, index: u32, to: BackBufferState) -> RenderResult<()> {
        let current = self.states[index as usize];
        if current == to {
            return Err(RenderError::Frame(format!(
                "Back buffer {} already in state {:?}",
                index, to
            )));
        }
        self.states[index as usize] = to;
        Ok(())
    }

    /// Resets every image to presentable after a swap-chain recreation.
    pub fn reset(&mut self, image_count: u32) {
        self.states = vec![BackBufferState::Present; image_count as usize];
    }
}

/// The ordered command-list sequence for one frame.
///
/// Push order is validated: exactly one Begin first, pipelines in the
/// middle, exactly one End last. `finish()` refuses incomplete frames -
/// partial frames are never submitted.
#[derive(Debug, Default)]
pub struct FrameSubmission {
    buffers: Vec<vk::CommandBuffer>,
    stages: Vec<FrameStage>,
    sealed: bool,
}

impl FrameSubmission {
    /// Starts an empty, unsealed submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage's command list, enforcing the frame ordering.
    ///
    /// # Errors
    ///
    /// Returns an error on any out-of-order push: a non-Begin first
    /// list, a second Begin, a list after End, or an End without Begin.
    pub fn push(&mut self, stage: FrameStage, buffer: vk::CommandBuffer) -> RenderResult<()> {
        if self.sealed {
            return Err(RenderError::Frame(
                "Frame submission already sealed".to_string(),
            ));
        }
        match stage {
            FrameStage::Begin => {
                if !self.stages.is_empty() {
                    return Err(RenderError::Frame(
                        "BeginFrame list must be first in the batch".to_string(),
                    ));
                }
            }
            FrameStage::Pipeline => {
                if self.stages.first() != Some(&FrameStage::Begin) {
                    return Err(RenderError::Frame(
                        "Pipeline list pushed before BeginFrame".to_string(),
                    ));
                }
            }
            FrameStage::End => {
                if self.stages.first() != Some(&FrameStage::Begin) {
                    return Err(RenderError::Frame(
                        "EndFrame list pushed before BeginFrame".to_string(),
                    ));
                }
                self.sealed = true;
            }
        }
        self.stages.push(stage);
        self.buffers.push(buffer);
        Ok(())
    }

    /// Seals and returns the ordered buffer sequence.
    ///
    /// # Errors
    ///
    /// Returns an error unless the sequence is exactly
    /// `[Begin, Pipeline.., End]`.
    pub fn finish(self) -> RenderResult<Vec<vk::CommandBuffer>> {
        if !self.sealed || self.stages.first() != Some(&FrameStage::Begin) {
            return Err(RenderError::Frame(
                "Frame submission incomplete: begin and end stages are mandatory".to_string(),
            ));
        }
        Ok(self.buffers)
    }

    /// The stage sequence recorded so far.
    pub fn stages(&self) -> &[FrameStage] {
        &self.stages
    }
}

/// Render-target binding contract handed to pipelines.
///
/// Every pipeline list binds exactly these views at exactly this extent;
/// BeginFrame established their state.
#[derive(Clone, Copy, Debug)]
pub struct RenderTargetBinding {
    /// View of the current back buffer.
    pub color_view: vk::ImageView,
    /// View of the frame's depth buffer.
    pub depth_view: vk::ImageView,
    /// Surface pixel size for viewport/scissor.
    pub extent: vk::Extent2D,
}

/// Records the begin/mid/end stages of every frame.
pub struct FrameOrchestrator {
    /// The opening command list.
    begin_cmd: CommandBuffer,
    /// The closing command list.
    end_cmd: CommandBuffer,
    /// Logical state per back-buffer image.
    state: ResourceStateTracker,
    /// Clear color applied at BeginFrame.
    clear_color: [f32; 4],
}

impl FrameOrchestrator {
    /// Allocates the begin/end lists from the shared pool.
    ///
    /// # Errors
    ///
    /// Returns an error if command-buffer allocation fails.
    pub fn new(
        ctx: &DeviceContext,
        image_count: u32,
        clear_color: [f32; 4],
    ) -> RenderResult<Self> {
        let begin_cmd = CommandBuffer::new(ctx.device().clone(), ctx.command_pool())?;
        let end_cmd = CommandBuffer::new(ctx.device().clone(), ctx.command_pool())?;

        Ok(Self {
            begin_cmd,
            end_cmd,
            state: ResourceStateTracker::new(image_count),
            clear_color,
        })
    }

    /// Resets per-image state after a swap-chain recreation.
    pub fn on_surface_recreated(&mut self, image_count: u32) {
        self.state.reset(image_count);
    }

    /// The render-target binding pipelines record against this frame.
    pub fn target_binding(
        &self,
        surface: &PresentationSurface,
        image_index: u32,
    ) -> RenderTargetBinding {
        RenderTargetBinding {
            color_view: surface.image_view(image_index),
            depth_view: surface.depth().image_view(),
            extent: surface.extent(),
        }
    }

    /// Stage 1: recycle the allocator, transition to render-target
    /// state, clear color and depth, close the list.
    ///
    /// # Errors
    ///
    /// Any reset/begin/close failure aborts the frame.
    pub fn begin_frame(
        &mut self,
        ctx: &DeviceContext,
        surface: &PresentationSurface,
        image_index: u32,
    ) -> RenderResult<()> {
        // The synchronizer guarantees the previous frame's lists retired;
        // only then is the pool reset legal.
        ctx.command_pool().reset()?;

        self.state
            .transition(image_index, BackBufferState::RenderTarget)?;

        let cmd = &self.begin_cmd;
        cmd.begin()?;

        // Presentation state -> render target. The image's prior contents
        // are cleared below, so acquisition-order history is irrelevant.
        let color_barrier = image_barrier(
            surface.image(image_index),
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        );
        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            &[color_barrier],
        );

        let depth_barrier = image_barrier(
            surface.depth().image(),
            vk::ImageAspectFlags::DEPTH,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        );
        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            &[depth_barrier],
        );

        // Clear both targets through a load-op CLEAR pass; pipelines and
        // the end stage re-bind with LOAD.
        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(surface.image_view(image_index))
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            });

        let depth_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(surface.depth().image_view())
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            });

        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: surface.extent(),
            })
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment))
            .depth_attachment(&depth_attachment);

        cmd.begin_rendering(&rendering_info);
        cmd.end_rendering();

        cmd.end()?;

        debug!("BeginFrame recorded for back buffer {}", image_index);
        Ok(())
    }

    /// Stage 2: reserved for cross-pipeline dependencies.
    ///
    /// No such dependency exists in the current design, so the stage
    /// contributes no list.
    pub fn mid_frame(&mut self) -> Option<vk::CommandBuffer> {
        None
    }

    /// Stage 3: bind targets, record the overlay, transition back to
    /// presentation state, close the list.
    ///
    /// # Errors
    ///
    /// Any begin/close failure aborts the frame.
    pub fn end_frame(
        &mut self,
        surface: &PresentationSurface,
        image_index: u32,
        overlay: &mut dyn OverlayRenderer,
        ctx: &DeviceContext,
    ) -> RenderResult<()> {
        self.state
            .transition(image_index, BackBufferState::Present)?;

        let cmd = &self.end_cmd;
        cmd.begin()?;

        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(surface.image_view(image_index))
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::STORE);

        let depth_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(surface.depth().image_view())
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::DONT_CARE);

        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: surface.extent(),
            })
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment))
            .depth_attachment(&depth_attachment);

        cmd.begin_rendering(&rendering_info);

        let mut overlay_ctx = OverlayContext {
            cmd,
            color_view: surface.image_view(image_index),
            depth_view: surface.depth().image_view(),
            extent: surface.extent(),
            device: ctx.device(),
        };
        overlay.record(&mut overlay_ctx);

        cmd.end_rendering();

        // Render target -> presentation state; executes after all draws
        // because it is recorded in the last list of the batch.
        let present_barrier = image_barrier(
            surface.image(image_index),
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::AccessFlags::empty(),
        );
        cmd.pipeline_barrier(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            &[present_barrier],
        );

        cmd.end()?;

        debug!("EndFrame recorded for back buffer {}", image_index);
        Ok(())
    }

    /// Assembles the frame's ordered submission batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting sequence would violate the
    /// `[begin, pipeline.., end]` ordering.
    pub fn assemble(
        &self,
        pipeline_lists: &[vk::CommandBuffer],
    ) -> RenderResult<Vec<vk::CommandBuffer>> {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, self.begin_cmd.handle())?;
        for &list in pipeline_lists {
            submission.push(FrameStage::Pipeline, list)?;
        }
        submission.push(FrameStage::End, self.end_cmd.handle())?;
        submission.finish()
    }
}

/// Builds a full-subresource image memory barrier.
fn image_barrier(
    image: vk::Image,
    aspect_mask: vk::ImageAspectFlags,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(aspect_mask)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1),
        )
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_cmd() -> vk::CommandBuffer {
        vk::CommandBuffer::null()
    }

    #[test]
    fn test_submission_accepts_canonical_order() {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, null_cmd()).unwrap();
        submission.push(FrameStage::Pipeline, null_cmd()).unwrap();
        submission.push(FrameStage::Pipeline, null_cmd()).unwrap();
        submission.push(FrameStage::End, null_cmd()).unwrap();

        assert_eq!(
            submission.stages(),
            &[
                FrameStage::Begin,
                FrameStage::Pipeline,
                FrameStage::Pipeline,
                FrameStage::End
            ]
        );
        assert_eq!(submission.finish().unwrap().len(), 4);
    }

    #[test]
    fn test_submission_accepts_zero_pipelines() {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, null_cmd()).unwrap();
        submission.push(FrameStage::End, null_cmd()).unwrap();
        assert_eq!(submission.finish().unwrap().len(), 2);
    }

    #[test]
    fn test_submission_rejects_pipeline_first() {
        let mut submission = FrameSubmission::new();
        assert!(submission.push(FrameStage::Pipeline, null_cmd()).is_err());
    }

    #[test]
    fn test_submission_rejects_end_first() {
        let mut submission = FrameSubmission::new();
        assert!(submission.push(FrameStage::End, null_cmd()).is_err());
    }

    #[test]
    fn test_submission_rejects_double_begin() {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, null_cmd()).unwrap();
        assert!(submission.push(FrameStage::Begin, null_cmd()).is_err());
    }

    #[test]
    fn test_submission_rejects_push_after_end() {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, null_cmd()).unwrap();
        submission.push(FrameStage::End, null_cmd()).unwrap();
        assert!(submission.push(FrameStage::Pipeline, null_cmd()).is_err());
    }

    #[test]
    fn test_submission_rejects_unsealed_finish() {
        let mut submission = FrameSubmission::new();
        submission.push(FrameStage::Begin, null_cmd()).unwrap();
        assert!(submission.finish().is_err());

        let empty = FrameSubmission::new();
        assert!(empty.finish().is_err());
    }

    #[test]
    fn test_state_tracker_round_trip() {
        let mut tracker = ResourceStateTracker::new(2);
        assert_eq!(tracker.state(0), BackBufferState::Present);

        // Present -> RenderTarget (BeginFrame), RenderTarget -> Present
        // (EndFrame), repeated per frame with no same-state pairs.
        for _ in 0..3 {
            tracker
                .transition(0, BackBufferState::RenderTarget)
                .unwrap();
            tracker.transition(0, BackBufferState::Present).unwrap();
        }
        assert_eq!(tracker.state(0), BackBufferState::Present);
    }

    #[test]
    fn test_state_tracker_rejects_same_state_transition() {
        let mut tracker = ResourceStateTracker::new(1);
        tracker
            .transition(0, BackBufferState::RenderTarget)
            .unwrap();
        assert!(tracker
            .transition(0, BackBufferState::RenderTarget)
            .is_err());
    }

    #[test]
    fn test_state_tracker_per_image_independence() {
        let mut tracker = ResourceStateTracker::new(2);
        tracker
            .transition(0, BackBufferState::RenderTarget)
            .unwrap();
        assert_eq!(tracker.state(1), BackBufferState::Present);
        tracker
            .transition(1, BackBufferState::RenderTarget)
            .unwrap();
    }

    #[test]
    fn test_state_tracker_reset() {
        let mut tracker = ResourceStateTracker::new(1);
        tracker
            .transition(0, BackBufferState::RenderTarget)
            .unwrap();
        tracker.reset(3);
        assert_eq!(tracker.state(2), BackBufferState::Present);
    }
}
