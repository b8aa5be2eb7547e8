//! Mesh rendering pipeline.
//!
//! One [`MeshPipeline`] owns one drawable's complete GPU-side
//! representation: the compiled shader pair, the root bindings
//! (descriptor-set layout + pipeline layout), the immutable pipeline
//! state object, the static vertex/index buffers, and the persistently
//! mapped per-frame constant buffer. It knows how to refresh its
//! constants and how to populate its own command list for the frame's
//! submission batch.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use vantage_rhi::buffer::{Buffer, BufferUsage};
use vantage_rhi::command::CommandBuffer;
use vantage_rhi::descriptor::{
    uniform_buffer_binding, write_uniform_buffer, DescriptorPool, DescriptorSetLayout,
};
use vantage_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use vantage_rhi::shader::{Shader, ShaderStage};
use vantage_rhi::vertex::VertexLayout;
use vantage_rhi::vk;

use crate::constants::TransformBlock;
use crate::context::DeviceContext;
use crate::depth::DEPTH_FORMAT;
use crate::error::{RenderError, RenderResult};
use crate::mesh_data::MeshData;
use crate::orchestrator::RenderTargetBinding;

/// Construction-time description of a mesh pipeline.
#[derive(Clone, Debug)]
pub struct MeshPipelineDesc {
    /// Vertex layout the pipeline state is built for.
    pub vertex_layout: VertexLayout,
    /// Path to the compiled vertex-stage artifact.
    pub vertex_shader: PathBuf,
    /// Path to the compiled fragment-stage artifact.
    pub fragment_shader: PathBuf,
}

impl MeshPipelineDesc {
    /// Describes a pipeline for the given layout and shader pair.
    pub fn new(
        vertex_layout: VertexLayout,
        vertex_shader: impl Into<PathBuf>,
        fragment_shader: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vertex_layout,
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
        }
    }
}

/// One drawable's GPU-side representation and its command list.
pub struct MeshPipeline {
    /// This pipeline's own command list, backed by the shared pool.
    cmd: CommandBuffer,
    /// Immutable pipeline state object.
    pipeline: Pipeline,
    /// Root binding contract (one constant-buffer table).
    pipeline_layout: PipelineLayout,
    /// Layout of the constant-buffer table.
    _set_layout: DescriptorSetLayout,
    /// Pool the descriptor set lives in.
    _descriptor_pool: DescriptorPool,
    /// The constant-buffer descriptor set.
    descriptor_set: vk::DescriptorSet,
    /// Static vertex data, uploaded once.
    vertex_buffer: Buffer,
    /// Static index data, uploaded once.
    index_buffer: Buffer,
    /// Persistently mapped per-frame constants.
    constant_buffer: Buffer,
    /// Number of indices in one draw.
    index_count: u32,
}

impl MeshPipeline {
    /// Builds the complete pipeline for one drawable.
    ///
    /// Compiled shaders are loaded, the pipeline state object is built
    /// from the fixed vertex-layout description, static vertex/index
    /// data is uploaded once, and the constant buffer is created at its
    /// 256-byte-rounded size and left mapped for per-frame writes.
    ///
    /// # Errors
    ///
    /// Every failure here is a setup failure: shader artifacts missing,
    /// pipeline creation rejected, buffer allocation failed. All fatal.
    pub fn new(
        ctx: &DeviceContext,
        desc: &MeshPipelineDesc,
        mesh: &MeshData,
        color_format: vk::Format,
    ) -> RenderResult<Self> {
        mesh.check_consistent()?;

        let device = ctx.device().clone();

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new(&desc.vertex_shader),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new(&desc.fragment_shader),
            ShaderStage::Fragment,
            "main",
        )?;

        // One descriptor-table binding: the transform block, vertex stage
        let set_layout = DescriptorSetLayout::new(
            device.clone(),
            &[uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX)],
        )?;
        let pipeline_layout = PipelineLayout::new(device.clone(), &[set_layout.handle()])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(desc.vertex_layout.binding_description())
            .vertex_attributes(&desc.vertex_layout.attribute_descriptions())
            .color_attachment_format(color_format)
            .depth_attachment_format(DEPTH_FORMAT)
            .build(device.clone(), &pipeline_layout)?;

        // Static geometry goes up exactly once
        let vertex_bytes = match desc.vertex_layout {
            VertexLayout::PositionColor => {
                bytemuck::cast_slice(&mesh.to_position_color()).to_vec()
            }
            VertexLayout::PositionNormalColor => {
                bytemuck::cast_slice(&mesh.to_position_normal_color()).to_vec()
            }
        };
        let vertex_buffer = Buffer::new_with_data(device.clone(), BufferUsage::Vertex, &vertex_bytes)?;

        let indices = mesh.sequential_indices();
        let index_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Index,
            bytemuck::cast_slice(&indices),
        )?;

        // Rounded to the 256-byte hardware boundary, mapped for life
        let constant_buffer = Buffer::new(
            device.clone(),
            BufferUsage::Uniform,
            TransformBlock::ALIGNED_SIZE,
        )?;
        constant_buffer.write_data(0, bytemuck::bytes_of(&TransformBlock::identity()))?;

        let pool_sizes = [vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)];
        let descriptor_pool = DescriptorPool::new(device.clone(), 1, &pool_sizes)?;
        let descriptor_set = descriptor_pool.allocate(&[set_layout.handle()])?[0];
        write_uniform_buffer(
            &device,
            descriptor_set,
            0,
            constant_buffer.handle(),
            TransformBlock::ALIGNED_SIZE,
        );

        let cmd = CommandBuffer::new(device.clone(), ctx.command_pool())?;

        info!(
            "Mesh pipeline created: {} vertices, {} triangles, layout {:?}",
            mesh.vertex_count(),
            mesh.triangle_count(),
            desc.vertex_layout
        );

        Ok(Self {
            cmd,
            pipeline,
            pipeline_layout,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
            descriptor_set,
            vertex_buffer,
            index_buffer,
            constant_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// Copies the transform block into the mapped constant buffer.
    ///
    /// A single contiguous copy: repeated calls before one `render()`
    /// leave only the last-written block visible. No GPU synchronization
    /// happens here - the fully serialized frame loop guarantees the GPU
    /// is not reading the buffer while the CPU writes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped write fails.
    pub fn update(&self, block: &TransformBlock) -> RenderResult<()> {
        self.constant_buffer
            .write_data(0, bytemuck::bytes_of(block))
            .map_err(RenderError::from)
    }

    /// Records this drawable's command list for the frame.
    ///
    /// Binds the pipeline state, root bindings and the orchestrator's
    /// current render-target binding, fixes viewport and scissor to the
    /// surface extent, and issues one indexed draw. Returns the closed
    /// list for inclusion in the submission batch.
    ///
    /// # Errors
    ///
    /// Any begin/close failure aborts the frame.
    pub fn populate(&self, binding: &RenderTargetBinding) -> RenderResult<vk::CommandBuffer> {
        let cmd = &self.cmd;
        cmd.begin()?;

        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(binding.color_view)
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::STORE);

        let depth_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(binding.depth_view)
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::STORE);

        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: binding.extent,
            })
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment))
            .depth_attachment(&depth_attachment);

        cmd.begin_rendering(&rendering_info);

        cmd.bind_pipeline(self.pipeline.handle());
        cmd.bind_descriptor_sets(self.pipeline_layout.handle(), 0, &[self.descriptor_set]);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: binding.extent.width as f32,
            height: binding.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: binding.extent,
        };
        cmd.set_scissor(&scissor);

        cmd.bind_vertex_buffers(&[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0);

        cmd.end_rendering();
        cmd.end()?;

        debug!("Mesh pipeline list recorded ({} indices)", self.index_count);
        Ok(cmd.handle())
    }

    /// Number of indices this pipeline draws.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Size of the constant-buffer allocation in bytes.
    #[inline]
    pub fn constant_buffer_size(&self) -> u64 {
        self.constant_buffer.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_construction() {
        let desc = MeshPipelineDesc::new(
            VertexLayout::PositionColor,
            "shaders/flat.vert.spv",
            "shaders/flat.frag.spv",
        );
        assert_eq!(desc.vertex_layout, VertexLayout::PositionColor);
        assert!(desc.vertex_shader.ends_with("flat.vert.spv"));
        assert!(desc.fragment_shader.ends_with("flat.frag.spv"));
    }
}
