//! Vertex formats and input-layout descriptions.
//!
//! Two fixed layouts cover every drawable in this renderer, selected per
//! pipeline at construction time:
//!
//! - [`PositionColor`] - position + color
//! - [`PositionNormalColor`] - position + normal + color
//!
//! Fields are raw float arrays so the structs pack exactly like the
//! shader input layout expects, with no SIMD alignment padding.

use ash::vk;
use bytemuck::{Pod, Zeroable};

/// Vertex with position and color.
///
/// Layout: position at offset 0 (12 bytes), color at offset 12
/// (16 bytes), stride 28.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PositionColor {
    /// Object-space position.
    pub position: [f32; 3],
    /// RGBA color.
    pub color: [f32; 4],
}

impl PositionColor {
    /// Creates a new vertex.
    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// Vertex input binding for binding slot 0.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Attribute descriptions matching the shader's input semantics.
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            // position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // color at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 12,
            },
        ]
    }
}

/// Vertex with position, normal and color.
///
/// Layout: position at 0, normal at 12, color at 24, stride 40.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PositionNormalColor {
    /// Object-space position.
    pub position: [f32; 3],
    /// Surface normal (normalized).
    pub normal: [f32; 3],
    /// RGBA color.
    pub color: [f32; 4],
}

impl PositionNormalColor {
    /// Creates a new vertex.
    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }

    /// Vertex input binding for binding slot 0.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Attribute descriptions matching the shader's input semantics.
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            // position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // normal at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            // color at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32A32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

/// Vertex layout variants a mesh pipeline can be built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexLayout {
    /// Position + color
    PositionColor,
    /// Position + normal + color
    PositionNormalColor,
}

impl VertexLayout {
    /// Returns the binding description for the layout.
    pub fn binding_description(self) -> vk::VertexInputBindingDescription {
        match self {
            VertexLayout::PositionColor => PositionColor::binding_description(),
            VertexLayout::PositionNormalColor => PositionNormalColor::binding_description(),
        }
    }

    /// Returns the attribute descriptions for the layout.
    pub fn attribute_descriptions(self) -> Vec<vk::VertexInputAttributeDescription> {
        match self {
            VertexLayout::PositionColor => PositionColor::attribute_descriptions(),
            VertexLayout::PositionNormalColor => PositionNormalColor::attribute_descriptions(),
        }
    }

    /// Returns the vertex stride in bytes.
    pub fn stride(self) -> u32 {
        match self {
            VertexLayout::PositionColor => std::mem::size_of::<PositionColor>() as u32,
            VertexLayout::PositionNormalColor => std::mem::size_of::<PositionNormalColor>() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_position_color_layout() {
        assert_eq!(std::mem::size_of::<PositionColor>(), 28);
        assert_eq!(offset_of!(PositionColor, position), 0);
        assert_eq!(offset_of!(PositionColor, color), 12);

        let binding = PositionColor::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 28);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_position_color_attributes() {
        let attrs = PositionColor::attribute_descriptions();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32A32_SFLOAT);
        assert_eq!(attrs[1].offset, 12);
    }

    #[test]
    fn test_position_normal_color_layout() {
        assert_eq!(std::mem::size_of::<PositionNormalColor>(), 40);
        assert_eq!(offset_of!(PositionNormalColor, position), 0);
        assert_eq!(offset_of!(PositionNormalColor, normal), 12);
        assert_eq!(offset_of!(PositionNormalColor, color), 24);

        let attrs = PositionNormalColor::attribute_descriptions();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
    }

    #[test]
    fn test_vertex_layout_strides() {
        assert_eq!(VertexLayout::PositionColor.stride(), 28);
        assert_eq!(VertexLayout::PositionNormalColor.stride(), 40);
    }

    #[test]
    fn test_vertex_pod_roundtrip() {
        let vertex = PositionColor::new([0.0, 0.25, 0.0], [1.0, 0.0, 0.0, 1.0]);
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 28);

        let back: &PositionColor = bytemuck::from_bytes(bytes);
        assert_eq!(back.position, vertex.position);
        assert_eq!(back.color, vertex.color);
    }
}
