//! Descriptor set management.
//!
//! The descriptor table is how a pipeline's shaders reach the per-frame
//! constant buffer: one set layout with one uniform-buffer binding, one
//! pool sized for the pipelines that exist, one write per set pointing
//! at a buffer range. No component writes another component's slot.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Builds a uniform-buffer binding description.
pub fn uniform_buffer_binding(
    binding: u32,
    stages: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(1)
        .stage_flags(stages)
}

/// Descriptor set layout wrapper.
///
/// Declares what resource bindings a pipeline's shaders expect - the
/// binding points, descriptor types and visible stages.
pub struct DescriptorSetLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor set layout handle.
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool wrapper.
///
/// Allocation-only; sets live as long as the pool. The renderer never
/// frees individual sets.
pub struct DescriptorPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor pool handle.
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Creates a descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `max_sets` - maximum number of sets allocatable from the pool
    /// * `pool_sizes` - descriptor capacities per type
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!("Created descriptor pool (max {} sets)", max_sets);

        Ok(Self { device, pool })
    }

    /// Allocates one descriptor set per layout handle.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails (pool exhausted).
    pub fn allocate(&self, layouts: &[vk::DescriptorSetLayout]) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };
        Ok(sets)
    }

    /// Returns the Vulkan descriptor pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Points `set`'s uniform-buffer binding at a buffer range.
pub fn write_uniform_buffer(
    device: &Device,
    set: vk::DescriptorSet,
    binding: u32,
    buffer: vk::Buffer,
    range: vk::DeviceSize,
) {
    let buffer_info = [vk::DescriptorBufferInfo::default()
        .buffer(buffer)
        .offset(0)
        .range(range)];

    let writes = [vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(binding)
        .dst_array_element(0)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .buffer_info(&buffer_info)];

    unsafe {
        device.handle().update_descriptor_sets(&writes, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffer_binding() {
        let binding = uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_uniform_buffer_binding_multiple_stages() {
        let binding = uniform_buffer_binding(
            1,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        );
        assert_eq!(binding.binding, 1);
        assert!(binding.stage_flags.contains(vk::ShaderStageFlags::VERTEX));
        assert!(binding.stage_flags.contains(vk::ShaderStageFlags::FRAGMENT));
    }
}
