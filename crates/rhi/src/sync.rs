//! Synchronization primitives.
//!
//! Two kinds of object cover all synchronization in this renderer:
//!
//! - [`TimelineFence`] - a monotonically increasing 64-bit counter the
//!   queue signals on completion and the host waits on. This is the one
//!   CPU/GPU rendezvous point: command-pool recycling and GPU resource
//!   release are only legal after a fence wait confirms retirement.
//! - [`BinarySemaphore`] - GPU-to-GPU ordering between swapchain image
//!   acquisition, the frame submission, and presentation.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Timeline-semaphore fence.
///
/// The counter has two independent views: the *submitted* value (last
/// value handed to the queue for signaling, tracked by the caller) and
/// the *completed* value (value the device has reached, read from the
/// semaphore). `completed <= submitted` holds at all times.
pub struct TimelineFence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Timeline semaphore handle.
    semaphore: vk::Semaphore,
}

impl TimelineFence {
    /// Creates a timeline fence with an initial counter value of 0.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(0);

        let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created timeline fence");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    ///
    /// Used to attach the fence to a queue submission's signal list.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// Reads the value the device has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter query fails.
    pub fn completed(&self) -> RhiResult<u64> {
        let value = unsafe {
            self.device
                .handle()
                .get_semaphore_counter_value(self.semaphore)?
        };
        Ok(value)
    }

    /// Blocks the calling thread until the device reaches `value`.
    ///
    /// Returns immediately when the value is already reached. `timeout`
    /// is in nanoseconds; the steady-state frame loop passes `u64::MAX`,
    /// shutdown paths may bound it.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails or times out.
    pub fn wait(&self, value: u64, timeout: u64) -> RhiResult<()> {
        let semaphores = [self.semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);

        unsafe {
            self.device
                .handle()
                .wait_semaphores(&wait_info, timeout)
                .map_err(RhiError::from)?;
        }
        Ok(())
    }
}

impl Drop for TimelineFence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed timeline fence");
    }
}

/// Binary semaphore for queue-internal ordering.
///
/// Used in two roles per frame: image-available (signaled by acquire,
/// waited by the submission) and render-finished (signaled by the
/// submission, waited by presentation).
pub struct BinarySemaphore {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan semaphore handle.
    semaphore: vk::Semaphore,
}

impl BinarySemaphore {
    /// Creates a semaphore in the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created binary semaphore");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for BinarySemaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed binary semaphore");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_fence_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TimelineFence>();
    }

    #[test]
    fn test_binary_semaphore_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BinarySemaphore>();
    }
}
