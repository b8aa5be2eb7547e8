//! Swapchain lifecycle.
//!
//! Handles VkSwapchainKHR creation at a fixed pixel size and format,
//! image acquisition, presentation, and full recreation on resize.
//!
//! The swapchain is created with the exact client extent (clamped only to
//! hard surface limits) and never lets the presentation engine resample
//! the buffers: overlay geometry depends on a 1:1 pixel mapping.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::RhiError;
use crate::instance::Instance;

/// Surface capability snapshot used for swapchain creation.
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Surface capabilities (image count bounds, extents, transforms).
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format/color-space combinations.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Queries surface support for a physical device.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the surface queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self, RhiError> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// True when at least one format and one present mode exist.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain wrapper.
///
/// Owns the swapchain handle and one image view per backing image. The
/// images themselves belong to the swapchain and are released with it.
pub struct Swapchain {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Swapchain extension loader
    loader: ash::khr::swapchain::Device,
    /// Swapchain handle
    swapchain: vk::SwapchainKHR,
    /// Backing images (owned by the swapchain)
    images: Vec<vk::Image>,
    /// One view per backing image
    image_views: Vec<vk::ImageView>,
    /// Pixel format of the backing images
    format: vk::Format,
    /// Fixed pixel size
    extent: vk::Extent2D,
    /// Present mode selected at creation
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a swapchain bound to `surface` at the exact pixel size.
    ///
    /// `buffer_count` is the requested ring length, clamped to the
    /// surface's hard limits. `vsync` selects FIFO (on) or an immediate
    /// mode (off, falling back to FIFO where unsupported).
    ///
    /// # Errors
    ///
    /// Fails fatally if the surface is inadequate, the swapchain cannot
    /// be created, or any image retrieval / view creation fails.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        buffer_count: u32,
        vsync: bool,
    ) -> Result<Self, RhiError> {
        Self::create_internal(
            instance,
            device,
            surface,
            width,
            height,
            buffer_count,
            vsync,
            vk::SwapchainKHR::null(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create_internal(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        buffer_count: u32,
        vsync: bool,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<Self, RhiError> {
        let loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        let support = SurfaceSupport::query(device.physical_device(), surface, &surface_loader)?;
        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Surface reports no formats or present modes".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes, vsync);
        let extent = choose_extent(&support.capabilities, width, height);
        let image_count = clamp_image_count(buffer_count, &support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} buffers",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None)? };

        let images = unsafe { loader.get_swapchain_images(swapchain)? };
        debug!("Swapchain created with {} images", images.len());

        let image_views = create_image_views(&device, &images, surface_format.format)?;

        Ok(Self {
            device,
            loader,
            swapchain,
            images,
            image_views,
            format: surface_format.format,
            extent,
            present_mode,
        })
    }

    /// Recreates the swapchain for a new pixel size.
    ///
    /// The caller must have drained the GPU first (frame synchronizer);
    /// this releases every per-image view, hands the old swapchain to the
    /// new one for resource reuse, then rebuilds the views.
    ///
    /// # Errors
    ///
    /// Returns an error if recreation fails.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        buffer_count: u32,
        vsync: bool,
    ) -> Result<(), RhiError> {
        info!("Recreating swapchain at {}x{}", width, height);

        // Release owning view references before the images go away
        self.destroy_image_views();

        let old_swapchain = self.swapchain;
        let mut replacement = Self::create_internal(
            instance,
            self.device.clone(),
            surface,
            width,
            height,
            buffer_count,
            vsync,
            old_swapchain,
        )?;

        unsafe {
            self.loader.destroy_swapchain(old_swapchain, None);
        }

        self.swapchain = replacement.swapchain;
        self.images = std::mem::take(&mut replacement.images);
        self.image_views = std::mem::take(&mut replacement.image_views);
        self.format = replacement.format;
        self.extent = replacement.extent;
        self.present_mode = replacement.present_mode;

        // Neutralize the replacement's Drop so the moved handle survives
        replacement.swapchain = vk::SwapchainKHR::null();

        Ok(())
    }

    /// Acquires the index of the image the presentation engine will hand
    /// out next.
    ///
    /// Returns `(image_index, suboptimal)`. The index must never be
    /// assumed to increment linearly; some presentation models hand out
    /// back buffers out of order.
    ///
    /// # Errors
    ///
    /// Propagates `vk::Result::ERROR_OUT_OF_DATE_KHR` when the surface
    /// has changed and the swapchain must be recreated.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        unsafe {
            self.loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    /// Presents image `image_index`, waiting on `wait_semaphore`.
    ///
    /// Returns true when the swapchain is suboptimal and should be
    /// recreated.
    ///
    /// # Errors
    ///
    /// Propagates `vk::Result::ERROR_OUT_OF_DATE_KHR` for the resize path;
    /// any other failure is fatal to the frame.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.loader.queue_present(queue, &present_info) }
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the fixed pixel size.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the present mode selected at creation.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of backing images.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Returns the backing image at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image(&self, index: usize) -> vk::Image {
        self.images[index]
    }

    /// Returns the image view at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }

    fn destroy_image_views(&mut self) {
        for &view in &self.image_views {
            unsafe {
                self.device.handle().destroy_image_view(view, None);
            }
        }
        self.image_views.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();

        // Null after a recreate moved the handle out
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.loader.destroy_swapchain(self.swapchain, None);
            }
            info!(
                "Swapchain destroyed ({}x{}, {} images)",
                self.extent.width,
                self.extent.height,
                self.images.len()
            );
        }
    }
}

/// Chooses the surface format.
///
/// The renderer's fixed format is `B8G8R8A8_UNORM`; an SRGB variant is
/// accepted as second choice, then whatever the surface lists first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_UNORM
            && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });
    if let Some(&format) = preferred {
        return format;
    }

    let alternative = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });
    if let Some(&format) = alternative {
        warn!("B8G8R8A8_UNORM unavailable, using B8G8R8A8_SRGB");
        return format;
    }

    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Maps the vsync flag to a present mode.
///
/// vsync on: FIFO (every Vulkan surface supports it). vsync off: IMMEDIATE when
/// available, MAILBOX as a tear-free second choice, FIFO otherwise.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    if modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
        return vk::PresentModeKHR::IMMEDIATE;
    }
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        return vk::PresentModeKHR::MAILBOX;
    }
    vk::PresentModeKHR::FIFO
}

/// Resolves the swapchain extent for the requested client size.
///
/// When the surface pins the extent, that wins; otherwise the request is
/// clamped to the surface's limits.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Clamps the requested buffer count to the surface's hard limits.
pub fn clamp_image_count(requested: u32, capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = requested.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count = count.min(capabilities.max_image_count);
    }
    count
}

/// Creates one 2D color view per swapchain image.
fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>, RhiError> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe {
            device
                .handle()
                .create_image_view(&create_info, None)
                .map_err(|e| {
                    RhiError::SwapchainError(format!(
                        "Failed to create view for image {}: {:?}",
                        i, e
                    ))
                })?
        };
        image_views.push(view);
    }

    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_unorm() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_choose_surface_format_srgb_fallback() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn test_choose_surface_format_last_resort() {
        let formats = vec![vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn test_present_mode_vsync_is_fifo() {
        let modes = vec![
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::FIFO,
        ];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_present_mode_no_vsync_prefers_immediate() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(
            choose_present_mode(&modes, false),
            vk::PresentModeKHR::IMMEDIATE
        );
    }

    #[test]
    fn test_present_mode_no_vsync_falls_back() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&modes, false),
            vk::PresentModeKHR::MAILBOX
        );

        let fifo_only = vec![vk::PresentModeKHR::FIFO];
        assert_eq!(
            choose_present_mode(&fifo_only, false),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn test_choose_extent_uses_pinned_extent() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1024,
                height: 768,
            },
            ..Default::default()
        };
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (1024, 768));
    }

    #[test]
    fn test_choose_extent_clamps_request() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 64,
                height: 64,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let exact = choose_extent(&capabilities, 800, 600);
        assert_eq!((exact.width, exact.height), (800, 600));

        let clamped = choose_extent(&capabilities, 10_000, 10);
        assert_eq!((clamped.width, clamped.height), (4096, 64));
    }

    #[test]
    fn test_clamp_image_count() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(clamp_image_count(2, &capabilities), 2);
        assert_eq!(clamp_image_count(1, &capabilities), 2);
        assert_eq!(clamp_image_count(8, &capabilities), 3);

        // max_image_count == 0 means no upper limit
        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(clamp_image_count(5, &unbounded), 5);
    }

    #[test]
    fn test_surface_support_is_adequate() {
        let adequate = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SurfaceSupport {
            formats: vec![],
            ..adequate.clone()
        };
        assert!(!no_formats.is_adequate());
    }
}
