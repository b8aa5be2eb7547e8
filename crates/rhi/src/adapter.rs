//! Graphics adapter (physical device) selection.
//!
//! Selection policy: prefer the first enumerated adapter that reports
//! itself as a discrete GPU (the "high performance" hint); fall back to
//! the first adapter in enumeration order that meets the requirements.
//! An adapter is suitable when it exposes one queue family supporting
//! both graphics and presentation to the target surface and speaks the
//! fixed minimum API version (Vulkan 1.3). Adapter failures are treated
//! as unrecoverable for the process lifetime; there is no retry.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Minimum API version every accepted adapter must report.
const MINIMUM_API_VERSION: u32 = vk::API_VERSION_1_3;

/// Information about a selected adapter.
///
/// Carries everything device creation needs: the physical device handle,
/// its properties and the single direct-queue family index.
#[derive(Clone)]
pub struct AdapterInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version).
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family supporting both graphics and present.
    pub queue_family: u32,
}

impl AdapterInfo {
    /// Returns the adapter name as a string.
    pub fn name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Adapter")
        }
    }

    /// Returns a human-readable string for the adapter type.
    pub fn type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }

    /// Returns the (major, minor, patch) API version the adapter reports.
    pub fn api_version(&self) -> (u32, u32, u32) {
        let version = self.properties.api_version;
        (
            vk::api_version_major(version),
            vk::api_version_minor(version),
            vk::api_version_patch(version),
        )
    }
}

impl std::fmt::Debug for AdapterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.api_version();
        f.debug_struct("AdapterInfo")
            .field("name", &self.name())
            .field("type", &self.type_name())
            .field("api_version", &format!("{}.{}.{}", major, minor, patch))
            .field("queue_family", &self.queue_family)
            .finish()
    }
}

/// Selects the adapter the renderer will use for its whole lifetime.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableAdapter`] when no enumerated adapter
/// meets the requirements.
pub fn select_adapter(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<AdapterInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable adapters found");
        return Err(RhiError::NoSuitableAdapter);
    }

    info!("Found {} adapter(s)", devices.len());

    let mut candidates = Vec::new();
    for device in devices {
        if let Some(candidate) = check_adapter(instance, device, surface, surface_loader) {
            debug!(
                "Adapter '{}' ({}) is suitable",
                candidate.name(),
                candidate.type_name()
            );
            candidates.push(candidate);
        }
    }

    if candidates.is_empty() {
        warn!("No adapter meets the required feature level");
        return Err(RhiError::NoSuitableAdapter);
    }

    let types: Vec<vk::PhysicalDeviceType> = candidates
        .iter()
        .map(|c| c.properties.device_type)
        .collect();
    let index = preferred_index(&types);
    let selected = candidates.swap_remove(index);

    let (major, minor, patch) = selected.api_version();
    info!(
        "Using adapter: '{}' ({}), Vulkan {}.{}.{}",
        selected.name(),
        selected.type_name(),
        major,
        minor,
        patch
    );

    Ok(selected)
}

/// Applies the selection policy over the suitable candidates.
///
/// First discrete GPU in enumeration order wins; otherwise the first
/// candidate. Panics on an empty slice - callers check that beforehand.
fn preferred_index(types: &[vk::PhysicalDeviceType]) -> usize {
    types
        .iter()
        .position(|&t| t == vk::PhysicalDeviceType::DISCRETE_GPU)
        .unwrap_or(0)
}

/// Checks one adapter against the fixed requirements.
fn check_adapter(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<AdapterInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };

    let name = unsafe {
        CStr::from_ptr(properties.device_name.as_ptr())
            .to_str()
            .unwrap_or("Unknown")
    };

    if !meets_minimum_api(properties.api_version) {
        debug!(
            "Adapter '{}' skipped: Vulkan {}.{} below required 1.3",
            name,
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version)
        );
        return None;
    }

    let queue_family = find_direct_queue_family(instance, device, surface, surface_loader)?;

    Some(AdapterInfo {
        device,
        properties,
        queue_family,
    })
}

/// Whether the reported API version satisfies the fixed minimum.
fn meets_minimum_api(api_version: u32) -> bool {
    let major = vk::api_version_major(api_version);
    let minor = vk::api_version_minor(api_version);
    let (req_major, req_minor) = (
        vk::api_version_major(MINIMUM_API_VERSION),
        vk::api_version_minor(MINIMUM_API_VERSION),
    );
    major > req_major || (major == req_major && minor >= req_minor)
}

/// Finds one queue family supporting both graphics and present.
///
/// The design submits all work through a single direct queue, so a
/// split graphics/present configuration is rejected rather than handled.
fn find_direct_queue_family(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<u32> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if family.queue_count == 0 {
            continue;
        }
        if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            continue;
        }

        let present_support = unsafe {
            surface_loader
                .get_physical_device_surface_support(device, index, surface)
                .unwrap_or(false)
        };

        if present_support {
            return Some(index);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_index_picks_first_discrete() {
        let types = [
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
        ];
        assert_eq!(preferred_index(&types), 1);
    }

    #[test]
    fn test_preferred_index_falls_back_to_enumeration_order() {
        let types = [
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::VIRTUAL_GPU,
        ];
        assert_eq!(preferred_index(&types), 0);
    }

    #[test]
    fn test_meets_minimum_api() {
        assert!(meets_minimum_api(vk::API_VERSION_1_3));
        assert!(meets_minimum_api(vk::make_api_version(0, 1, 4, 0)));
        assert!(meets_minimum_api(vk::make_api_version(0, 2, 0, 0)));
        assert!(!meets_minimum_api(vk::API_VERSION_1_2));
        assert!(!meets_minimum_api(vk::API_VERSION_1_0));
    }
}
