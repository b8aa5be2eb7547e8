//! Device context.
//!
//! Owns everything with device-lifetime scope: the Vulkan instance, the
//! window surface, the selected adapter's logical device with its one
//! direct queue, the shared command allocator (command pool) recycled
//! every frame, and the frame fence.
//!
//! Initialization is all-or-nothing: any step failure is reported and
//! propagated, and no partially initialized context value ever exists -
//! `Renderer::render()` cannot be reached without a fully constructed
//! context. Device and adapter failures are unrecoverable for the
//! process lifetime; there are no retries.

use std::sync::Arc;

use tracing::{error, info};

use vantage_core::RenderConfig;
use vantage_platform::{Surface, Window};
use vantage_rhi::adapter::{select_adapter, AdapterInfo};
use vantage_rhi::command::CommandPool;
use vantage_rhi::device::Device;
use vantage_rhi::instance::Instance;
use vantage_rhi::sync::TimelineFence;
use vantage_rhi::vk;

use crate::error::{RenderError, RenderResult};

/// Device-lifetime GPU state.
///
/// Field order is destruction order: pool and fence release against a
/// live device, the surface against a live instance, the device before
/// the instance that created it.
pub struct DeviceContext {
    /// Shared command allocator; reset once per frame by BeginFrame.
    command_pool: CommandPool,
    /// Frame fence the queue signals and the synchronizer waits on.
    frame_fence: TimelineFence,
    /// Window surface the swap chain binds to.
    surface: Surface,
    /// Logical device; other components hold clones of this Arc.
    device: Arc<Device>,
    /// Vulkan instance, destroyed last.
    instance: Instance,
    /// Selected adapter description, kept for diagnostics.
    adapter: AdapterInfo,
}

impl DeviceContext {
    /// Runs the full device setup sequence.
    ///
    /// Instance → surface → adapter selection → logical device → shared
    /// command pool → frame fence. Each step's failure is logged as the
    /// user-visible fatal report and returned; the caller tears down by
    /// dropping whatever this function already built.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure. There is no recovery path that
    /// keeps rendering after one.
    pub fn initialize(window: &Window, _config: &RenderConfig) -> RenderResult<Self> {
        let enable_validation = cfg!(debug_assertions);

        let instance = Instance::new(enable_validation).map_err(|e| {
            error!("Failed to create Vulkan instance: {}", e);
            RenderError::from(e)
        })?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| {
                error!("Failed to create window surface: {}", e);
                RenderError::Surface(e.to_string())
            })?;

        let adapter = select_adapter(instance.handle(), surface.handle(), surface.loader())
            .map_err(|e| {
                error!("Failed to select a graphics adapter: {}", e);
                RenderError::from(e)
            })?;

        let device = Device::new(&instance, &adapter).map_err(|e| {
            error!("Failed to create logical device: {}", e);
            RenderError::from(e)
        })?;

        let command_pool = CommandPool::new(device.clone(), adapter.queue_family).map_err(|e| {
            error!("Failed to create command allocator: {}", e);
            RenderError::from(e)
        })?;

        let frame_fence = TimelineFence::new(device.clone()).map_err(|e| {
            error!("Failed to create frame fence: {}", e);
            RenderError::from(e)
        })?;

        info!(
            "Device context ready on '{}' ({})",
            adapter.name(),
            adapter.type_name()
        );

        Ok(Self {
            command_pool,
            frame_fence,
            surface,
            device,
            instance,
            adapter,
        })
    }

    /// Returns the logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the direct queue handle.
    #[inline]
    pub fn queue(&self) -> vk::Queue {
        self.device.queue()
    }

    /// Returns the shared command pool.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// Returns the frame fence.
    #[inline]
    pub fn frame_fence(&self) -> &TimelineFence {
        &self.frame_fence
    }

    /// Returns the Vulkan instance wrapper.
    #[inline]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Returns the raw window-surface handle.
    #[inline]
    pub fn surface_handle(&self) -> vk::SurfaceKHR {
        self.surface.handle()
    }

    /// Returns the selected adapter description.
    #[inline]
    pub fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        // Final drain: nothing below may release while work is in flight.
        // The renderer already waited on the frame fence; this catches
        // teardown paths that never submitted.
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to idle device during context teardown: {:?}", e);
        }
        info!("Device context destroyed");
    }
}
