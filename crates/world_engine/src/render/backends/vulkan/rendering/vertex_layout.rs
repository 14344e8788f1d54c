//! Vertex format and its Vulkan input description
//!
//! The shared vertex buffer is a tightly packed array of [`Vertex`]. The
//! attribute locations here must match `resources/shaders/scene.vert`.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use std::mem::{offset_of, size_of};

/// Interleaved vertex: position, normal, tangent, texture coordinate, color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Unit normal, zero when the source has none
    pub normal: [f32; 3],
    /// Tangent with handedness in `w`
    pub tangent: [f32; 4],
    /// First texture coordinate set
    pub tex_coord: [f32; 2],
    /// Vertex color
    pub color: [f32; 4],
}

impl Vertex {
    /// Vertex with position, normal and texture coordinate; white, no tangent
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tangent: [0.0; 4],
            tex_coord,
            color: [1.0; 4],
        }
    }
}

/// Vulkan vertex layout implementation for [`Vertex`]
pub struct VulkanVertexLayout;

impl VulkanVertexLayout {
    /// Binding 0, advanced per vertex
    pub fn get_binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Locations 0..=4 in field order
    pub fn get_attribute_descriptions() -> [vk::VertexInputAttributeDescription; 5] {
        let attribute = |location: u32, format: vk::Format, offset: usize| vk::VertexInputAttributeDescription {
            binding: 0,
            location,
            format,
            offset: offset as u32,
        };
        [
            attribute(0, vk::Format::R32G32B32_SFLOAT, offset_of!(Vertex, position)),
            attribute(1, vk::Format::R32G32B32_SFLOAT, offset_of!(Vertex, normal)),
            attribute(2, vk::Format::R32G32B32A32_SFLOAT, offset_of!(Vertex, tangent)),
            attribute(3, vk::Format::R32G32_SFLOAT, offset_of!(Vertex, tex_coord)),
            attribute(4, vk::Format::R32G32B32A32_SFLOAT, offset_of!(Vertex, color)),
        ]
    }

    /// Binding and attributes together, for pipeline creation
    pub fn get_input_state() -> (vk::VertexInputBindingDescription, [vk::VertexInputAttributeDescription; 5]) {
        (Self::get_binding_description(), Self::get_attribute_descriptions())
    }
}
