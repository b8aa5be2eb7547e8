//! Logical device and queue management.
//!
//! The renderer owns exactly one logical device for its whole lifetime
//! and exactly one direct queue (graphics + present) as its ordered
//! submission channel. Memory allocation goes through gpu-allocator.

use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, info};

use crate::adapter::AdapterInfo;
use crate::error::RhiError;
use crate::instance::Instance;

/// Required device extensions.
const DEVICE_EXTENSIONS: &[&std::ffi::CStr] =
    &[ash::khr::swapchain::NAME, ash::khr::dynamic_rendering::NAME];

/// Vulkan logical device wrapper.
///
/// Owns the device handle, the single direct queue and the memory
/// allocator. Shared across components as `Arc<Device>`; the allocator
/// sits behind a `Mutex` because resource constructors lock it briefly.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// GPU memory allocator.
    allocator: Mutex<Allocator>,
    /// The one direct queue all work is submitted through.
    queue: vk::Queue,
    /// Queue family index of the direct queue.
    queue_family: u32,
}

impl Device {
    /// Creates the logical device at the fixed minimum feature level.
    ///
    /// Enabled beyond the 1.0 core: timeline semaphores (1.2) for the
    /// frame fence and dynamic rendering (1.3) for pass-less attachment
    /// binding. Any creation failure is fatal to setup; there is no
    /// reduced-feature retry.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation or allocator initialization
    /// fails.
    pub fn new(instance: &Instance, adapter: &AdapterInfo) -> Result<Arc<Self>, RhiError> {
        let queue_priorities = [1.0f32];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(adapter.queue_family)
            .queue_priorities(&queue_priorities)];

        debug!(
            "Creating device with one direct queue (family {})",
            adapter.queue_family
        );

        let mut features_1_2 =
            vk::PhysicalDeviceVulkan12Features::default().timeline_semaphore(true);

        let mut features_1_3 = vk::PhysicalDeviceVulkan13Features::default()
            .dynamic_rendering(true)
            .synchronization2(true);

        let features = vk::PhysicalDeviceFeatures::default();

        let extension_names: Vec<*const i8> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut features_1_2)
            .push_next(&mut features_1_3);

        let device = unsafe {
            instance
                .handle()
                .create_device(adapter.device, &create_info, None)?
        };

        let queue = unsafe { device.get_device_queue(adapter.queue_family, 0) };

        info!(
            "Logical device created with {} extension(s)",
            DEVICE_EXTENSIONS.len()
        );

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: adapter.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        debug!("GPU memory allocator initialized");

        Ok(Arc::new(Self {
            device,
            physical_device: adapter.device,
            allocator: Mutex::new(allocator),
            queue,
            queue_family: adapter.queue_family,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the direct queue handle.
    #[inline]
    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    /// Returns the direct queue family index.
    #[inline]
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Returns a reference to the GPU memory allocator.
    #[inline]
    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }

    /// Blocks until all outstanding work on every queue has completed.
    ///
    /// Teardown-only escape hatch; per-frame pacing goes through the
    /// frame fence, not through device idles.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the direct queue.
    ///
    /// # Safety
    ///
    /// The caller must ensure every command buffer is recorded and closed,
    /// and that semaphore/fence usage follows the frame protocol.
    pub unsafe fn submit(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> Result<(), RhiError> {
        unsafe {
            self.device.queue_submit(self.queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: the raw handles are Copy, the allocator is behind a Mutex, and
// ash::Device is Send+Sync.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_extensions_defined() {
        assert!(DEVICE_EXTENSIONS.contains(&ash::khr::swapchain::NAME));
        assert!(DEVICE_EXTENSIONS.contains(&ash::khr::dynamic_rendering::NAME));
    }

    #[test]
    fn test_device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
