//! Presentation surface.
//!
//! Binds the swap chain to the platform window at a fixed pixel size and
//! buffer count, owns one view per backing image plus the depth buffer,
//! and tracks the current back-buffer index. Buffers are never resampled
//! by the presentation engine - the overlay depends on 1:1 pixels.

use tracing::{debug, info};

use vantage_core::RenderConfig;
use vantage_rhi::swapchain::Swapchain;
use vantage_rhi::vk;

use crate::context::DeviceContext;
use crate::depth::{DepthBuffer, DEPTH_FORMAT};
use crate::error::{RenderError, RenderResult};
use crate::sync::{BackBufferRing, FrameSynchronizer};

/// Outcome of a back-buffer acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Image acquired; the contained index is current.
    Acquired(u32),
    /// The surface changed under the swap chain; run the resize path
    /// before rendering.
    OutOfDate,
}

/// Swap chain, back-buffer ring and depth buffer for one window.
pub struct PresentationSurface {
    /// Depth image + view, recreated with the swap chain.
    depth: DepthBuffer,
    /// The platform swap chain and its per-image views.
    swapchain: Swapchain,
    /// Current back-buffer index tracking.
    ring: BackBufferRing,
    /// Requested ring length, reused on recreation.
    buffer_count: u32,
    /// Vsync flag, reused on recreation.
    vsync: bool,
}

impl PresentationSurface {
    /// Creates the surface at the configured size, format and buffer
    /// count.
    ///
    /// # Errors
    ///
    /// Fails fatally if swap chain creation, any image retrieval or any
    /// view creation fails.
    pub fn create(ctx: &DeviceContext, config: &RenderConfig) -> RenderResult<Self> {
        let swapchain = Swapchain::new(
            ctx.instance(),
            ctx.device().clone(),
            ctx.surface_handle(),
            config.width,
            config.height,
            config.buffer_count,
            config.vsync,
        )?;

        let extent = swapchain.extent();
        let depth = DepthBuffer::new(ctx.device().clone(), extent.width, extent.height)?;

        let ring = BackBufferRing::new(swapchain.image_count());

        info!(
            "Presentation surface ready: {}x{}, {} buffers, depth {:?}",
            extent.width,
            extent.height,
            swapchain.image_count(),
            DEPTH_FORMAT
        );

        Ok(Self {
            depth,
            swapchain,
            ring,
            buffer_count: config.buffer_count,
            vsync: config.vsync,
        })
    }

    /// Index of the image the presentation engine will display next.
    ///
    /// Refreshed by every [`acquire`](Self::acquire); always in
    /// `[0, buffer_count)`.
    #[inline]
    pub fn current_index(&self) -> u32 {
        self.ring.current()
    }

    /// Number of backing images actually created.
    #[inline]
    pub fn buffer_count(&self) -> u32 {
        self.ring.count()
    }

    /// Returns the fixed pixel size.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the back-buffer pixel format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Returns the backing image at `index`.
    #[inline]
    pub fn image(&self, index: u32) -> vk::Image {
        self.swapchain.image(index as usize)
    }

    /// Returns the render-target view for image `index`.
    #[inline]
    pub fn image_view(&self, index: u32) -> vk::ImageView {
        self.swapchain.image_view(index as usize)
    }

    /// Returns the depth buffer.
    #[inline]
    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Acquires the next back buffer, refreshing the current index.
    ///
    /// The index comes from the presentation engine and may be out of
    /// order; it is validated against the ring bounds.
    ///
    /// # Errors
    ///
    /// Out-of-date surfaces return [`AcquireOutcome::OutOfDate`] rather
    /// than an error; anything else is fatal to the frame.
    pub fn acquire(&mut self, semaphore: vk::Semaphore) -> RenderResult<AcquireOutcome> {
        match self.swapchain.acquire_next_image(semaphore) {
            Ok((index, _suboptimal)) => {
                self.ring.set_current(index)?;
                Ok(AcquireOutcome::Acquired(index))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swap chain out of date at acquire");
                Ok(AcquireOutcome::OutOfDate)
            }
            Err(e) => Err(RenderError::Vulkan(e)),
        }
    }

    /// Presents image `image_index`; one call per frame.
    ///
    /// Returns true when the swap chain should be recreated (suboptimal
    /// or out of date).
    ///
    /// # Errors
    ///
    /// Any presentation failure other than the recreate signals is fatal.
    pub fn present(
        &mut self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RenderResult<bool> {
        match self.swapchain.present(queue, image_index, wait_semaphore) {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swap chain out of date at present");
                Ok(true)
            }
            Err(e) => Err(RenderError::Vulkan(e)),
        }
    }

    /// Recreates the swap chain and depth buffer for a new pixel size.
    ///
    /// Order is load-bearing: drain the GPU via the frame synchronizer,
    /// release every buffer-resource reference, resize, recreate views.
    /// Skipping the drain would release resources an in-flight command
    /// list still references.
    ///
    /// # Errors
    ///
    /// Returns an error if the drain or any recreation step fails.
    pub fn resize(
        &mut self,
        ctx: &DeviceContext,
        sync: &FrameSynchronizer,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        sync.drain(ctx)?;
        // The presentation engine may still hold images; idle the device
        // before the old swap chain's buffers go away.
        ctx.device().wait_idle().map_err(RenderError::from)?;

        self.swapchain.recreate(
            ctx.instance(),
            ctx.surface_handle(),
            width,
            height,
            self.buffer_count,
            self.vsync,
        )?;

        let extent = self.swapchain.extent();
        self.depth = DepthBuffer::new(ctx.device().clone(), extent.width, extent.height)?;
        self.ring.reset(self.swapchain.image_count());

        info!(
            "Presentation surface resized to {}x{}",
            extent.width, extent.height
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_outcome_equality() {
        assert_eq!(AcquireOutcome::Acquired(1), AcquireOutcome::Acquired(1));
        assert_ne!(AcquireOutcome::Acquired(0), AcquireOutcome::Acquired(1));
        assert_ne!(AcquireOutcome::Acquired(0), AcquireOutcome::OutOfDate);
    }
}
