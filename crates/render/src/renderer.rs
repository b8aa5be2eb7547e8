//! Top-level renderer.
//!
//! Drives one frame at a time on a single CPU thread:
//! update → acquire → BeginFrame → per-pipeline populate → EndFrame →
//! one atomic submit → present → fence wait. The post-present wait is
//! the frame's only suspension point; CPU and GPU are fully serialized,
//! which is what legitimizes the shared allocator recycle and the
//! unsynchronized constant-buffer writes.

use glam::Mat4;
use tracing::{debug, error, info};

use vantage_core::RenderConfig;
use vantage_platform::Window;
use vantage_rhi::sync::BinarySemaphore;
use vantage_rhi::vk;

use crate::camera::Camera;
use crate::constants::TransformBlock;
use crate::context::DeviceContext;
use crate::error::RenderResult;
use crate::mesh::{MeshPipeline, MeshPipelineDesc};
use crate::mesh_data::MeshData;
use crate::orchestrator::FrameOrchestrator;
use crate::overlay::OverlayRenderer;
use crate::presentation::{AcquireOutcome, PresentationSurface};
use crate::sync::FrameSynchronizer;

/// Bounded fence timeout for the shutdown drain (5 seconds).
const SHUTDOWN_DRAIN_TIMEOUT_NS: u64 = 5_000_000_000;

/// The renderer: device context, presentation surface, synchronizer,
/// orchestrator and active pipelines, driven by `update()`/`render()`.
///
/// Construction is the readiness gate: a `Renderer` value only exists
/// when every setup step succeeded, so `render()` can never observe
/// partially initialized device state.
///
/// Field order is teardown order - pipelines and surface resources
/// release before the device context they were allocated from, and the
/// `Drop` impl drains the GPU before any of that starts.
pub struct Renderer {
    /// External overlay collaborator recorded during EndFrame.
    overlay: Box<dyn OverlayRenderer>,
    /// Active mesh pipelines, populated in registration order.
    pipelines: Vec<MeshPipeline>,
    /// Begin/mid/end stage recording.
    orchestrator: FrameOrchestrator,
    /// Swap chain, back-buffer ring, depth buffer.
    surface: PresentationSurface,
    /// Signaled by acquire, waited by the frame submission.
    acquire_semaphore: BinarySemaphore,
    /// Signaled by the submission, waited by present; one per image.
    render_finished: Vec<BinarySemaphore>,
    /// The CPU/GPU rendezvous point.
    sync: FrameSynchronizer,
    /// Fixed viewer camera.
    camera: Camera,
    /// Construction-time configuration.
    config: RenderConfig,
    /// Accumulated animation time in seconds.
    time: f32,
    /// Deferred resize request, applied at the top of the next frame.
    pending_resize: Option<(u32, u32)>,
    /// Device-lifetime state, destroyed last.
    ctx: DeviceContext,
}

impl Renderer {
    /// Runs the full setup sequence and uploads every drawable.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure; the caller reports it and exits.
    /// No partially initialized renderer survives an error here.
    pub fn new(
        window: &Window,
        config: RenderConfig,
        meshes: &[(MeshData, MeshPipelineDesc)],
        overlay: Box<dyn OverlayRenderer>,
    ) -> RenderResult<Self> {
        let ctx = DeviceContext::initialize(window, &config)?;
        let surface = PresentationSurface::create(&ctx, &config)?;

        let orchestrator =
            FrameOrchestrator::new(&ctx, surface.buffer_count(), config.clear_color)?;

        let mut pipelines = Vec::with_capacity(meshes.len());
        for (mesh, desc) in meshes {
            pipelines.push(MeshPipeline::new(&ctx, desc, mesh, surface.format())?);
        }

        let acquire_semaphore = BinarySemaphore::new(ctx.device().clone())?;
        let render_finished = Self::create_present_semaphores(&ctx, surface.buffer_count())?;

        let extent = surface.extent();
        let camera = Camera::new(
            config.fov_y_degrees,
            extent.width as f32 / extent.height as f32,
            config.near_plane,
            config.far_plane,
        );

        info!(
            "Renderer ready: {} pipeline(s), {} back buffers",
            pipelines.len(),
            surface.buffer_count()
        );

        Ok(Self {
            overlay,
            pipelines,
            orchestrator,
            surface,
            acquire_semaphore,
            render_finished,
            sync: FrameSynchronizer::new(),
            camera,
            config,
            time: 0.0,
            pending_resize: None,
            ctx,
        })
    }

    fn create_present_semaphores(
        ctx: &DeviceContext,
        count: u32,
    ) -> RenderResult<Vec<BinarySemaphore>> {
        (0..count)
            .map(|_| BinarySemaphore::new(ctx.device().clone()).map_err(Into::into))
            .collect()
    }

    /// Recomputes the transform block and writes it into every active
    /// pipeline's mapped constant buffer.
    ///
    /// Calling this more than once before a `render()` is harmless: the
    /// write is one contiguous copy and the last block wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a constant-buffer write fails.
    pub fn update(&mut self, delta_seconds: f32) -> RenderResult<()> {
        self.time += delta_seconds;

        let model = Mat4::from_rotation_y(self.time);
        let block = TransformBlock::new(model, self.camera.view(), self.camera.projection());

        for pipeline in &self.pipelines {
            pipeline.update(&block)?;
        }
        Ok(())
    }

    /// Renders and presents one frame.
    ///
    /// Any command-list or presentation failure aborts the frame with an
    /// error - no partial frame is ever submitted - and the caller is
    /// expected to request process termination.
    ///
    /// # Errors
    ///
    /// Returns the first frame-fatal failure.
    pub fn render(&mut self) -> RenderResult<()> {
        if let Some((width, height)) = self.pending_resize.take() {
            self.recreate_surface(width, height)?;
        }

        // Refresh the back-buffer index from the presentation engine
        let image_index = match self.surface.acquire(self.acquire_semaphore.handle())? {
            AcquireOutcome::Acquired(index) => index,
            AcquireOutcome::OutOfDate => {
                let extent = self.surface.extent();
                self.recreate_surface(extent.width, extent.height)?;
                return Ok(());
            }
        };

        // Stage 1, then every pipeline, then stage 3 - never reordered
        self.orchestrator
            .begin_frame(&self.ctx, &self.surface, image_index)?;

        let binding = self.orchestrator.target_binding(&self.surface, image_index);

        let mut lists = Vec::with_capacity(self.pipelines.len() + 1);
        if let Some(mid) = self.orchestrator.mid_frame() {
            lists.push(mid);
        }
        for pipeline in &self.pipelines {
            lists.push(pipeline.populate(&binding)?);
        }

        self.orchestrator
            .end_frame(&self.surface, image_index, self.overlay.as_mut(), &self.ctx)?;

        let buffers = self.orchestrator.assemble(&lists)?;

        // Single atomic batch: ordering within it is the frame contract
        let fence_value = self.sync.signal_and_advance();
        let present_semaphore = self.render_finished[image_index as usize].handle();

        let wait_semaphores = [self.acquire_semaphore.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [present_semaphore, self.ctx.frame_fence().handle()];
        let wait_values = [0u64];
        let signal_values = [0u64, fence_value];

        let mut timeline_info = vk::TimelineSemaphoreSubmitInfo::default()
            .wait_semaphore_values(&wait_values)
            .signal_semaphore_values(&signal_values);

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&buffers)
            .signal_semaphores(&signal_semaphores)
            .push_next(&mut timeline_info);

        unsafe {
            self.ctx.device().submit(&[submit_info], vk::Fence::null())?;
        }

        let needs_recreate =
            self.surface
                .present(self.ctx.queue(), image_index, present_semaphore)?;

        // The frame's one suspension point: block until the GPU drains
        self.sync.wait(&self.ctx, fence_value)?;

        if needs_recreate {
            let extent = self.surface.extent();
            self.recreate_surface(extent.width, extent.height)?;
        }

        Ok(())
    }

    /// Queues a resize; applied at the top of the next frame.
    ///
    /// Zero-sized requests (minimized window) are dropped.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to zero dimensions");
            return;
        }
        self.pending_resize = Some((width, height));
    }

    /// Drain → release → resize → recreate, strictly in that order.
    fn recreate_surface(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.surface.resize(&self.ctx, &self.sync, width, height)?;

        let count = self.surface.buffer_count();
        self.orchestrator.on_surface_recreated(count);
        self.render_finished = Self::create_present_semaphores(&self.ctx, count)?;

        let extent = self.surface.extent();
        self.camera
            .set_aspect(extent.width as f32 / extent.height as f32);
        self.config.width = extent.width;
        self.config.height = extent.height;

        Ok(())
    }

    /// Index of the back buffer the presentation engine returns next.
    #[inline]
    pub fn current_back_buffer(&self) -> u32 {
        self.surface.current_index()
    }

    /// Number of back buffers in the presentation ring.
    #[inline]
    pub fn buffer_count(&self) -> u32 {
        self.surface.buffer_count()
    }

    /// The configuration the renderer is currently running with.
    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Guaranteed drain: even when shutdown lands mid-frame, the
        // synchronizer wait completes before any resource teardown runs.
        if let Err(e) = self
            .sync
            .drain_with_timeout(&self.ctx, SHUTDOWN_DRAIN_TIMEOUT_NS)
        {
            error!("Frame drain failed during renderer teardown: {:?}", e);
        }
        info!("Renderer destroyed");
    }
}
