//! Depth buffer resource.
//!
//! One depth image + view per presentation surface, recreated with it on
//! resize. The orchestrator clears it at BeginFrame and every pipeline
//! pass binds it alongside the back-buffer view.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use tracing::{debug, info};

use vantage_rhi::device::Device;
use vantage_rhi::{RhiError, RhiResult};

/// Fixed depth format for the renderer.
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// GPU-resident depth image with its view.
pub struct DepthBuffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Vulkan image view handle.
    image_view: vk::ImageView,
    /// GPU memory allocation (taken on drop).
    allocation: Option<Allocation>,
    /// Depth buffer dimensions.
    extent: vk::Extent2D,
}

impl DepthBuffer {
    /// Creates a depth buffer at the given pixel size.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or image/memory/view
    /// creation fails. Failure here is fatal to surface setup.
    pub fn new(device: Arc<Device>, width: u32, height: u32) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidArgument(
                "Depth buffer dimensions must be greater than 0".to_string(),
            ));
        }

        let extent = vk::Extent2D { width, height };

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "depth_buffer",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe { device.handle().create_image_view(&view_info, None)? };

        info!("Created depth buffer: {}x{}", width, height);

        Ok(Self {
            device,
            image,
            image_view,
            allocation: Some(allocation),
            extent,
        })
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Returns the depth buffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        // View first, then image, then the allocation backing it
        unsafe {
            self.device
                .handle()
                .destroy_image_view(self.image_view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free depth buffer allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed depth buffer: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_format_is_depth_capable() {
        assert!(matches!(
            DEPTH_FORMAT,
            vk::Format::D32_SFLOAT
                | vk::Format::D32_SFLOAT_S8_UINT
                | vk::Format::D24_UNORM_S8_UINT
                | vk::Format::D16_UNORM
        ));
    }
}
