//! Mesh draw records and their per-draw constant block

use bytemuck::{Pod, Zeroable};

/// Texture index of the transparent placeholder
pub const PLACEHOLDER_TEXTURE: u32 = 0;

/// Texture indices for the five material slots.
///
/// Every index is valid: either a loaded texture or [`PLACEHOLDER_TEXTURE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshTextures {
    /// Base color
    pub base: u32,
    /// Metallic/roughness
    pub rough: u32,
    /// Tangent-space normal map
    pub normal: u32,
    /// Ambient occlusion
    pub occlusion: u32,
    /// Emissive color
    pub emissive: u32,
}

impl MeshTextures {
    /// Slots in descriptor binding order (bindings 2..=6)
    pub fn slots(&self) -> [u32; 5] {
        [self.base, self.rough, self.normal, self.occlusion, self.emissive]
    }

    /// Presence flags for the fragment shader
    pub fn constants(&self) -> MeshConstantData {
        let flag = |index: u32| if index == PLACEHOLDER_TEXTURE { 0.0 } else { 1.0 };
        MeshConstantData {
            has_base: flag(self.base),
            has_rough: flag(self.rough),
            has_normal: flag(self.normal),
            has_occlusion: flag(self.occlusion),
            has_emissive: flag(self.emissive),
        }
    }
}

/// Push constant block for the fragment stage, offset 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshConstantData {
    /// 1.0 when a base color texture is bound
    pub has_base: f32,
    /// 1.0 when a metallic/roughness texture is bound
    pub has_rough: f32,
    /// 1.0 when a normal map is bound
    pub has_normal: f32,
    /// 1.0 when an occlusion texture is bound
    pub has_occlusion: f32,
    /// 1.0 when an emissive texture is bound
    pub has_emissive: f32,
}

/// One draw: ranges into the shared buffers plus its textures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    /// Index of this mesh in the graph, also its descriptor set row
    pub mesh_id: usize,
    /// Node that owns the mesh
    pub node_id: usize,
    /// First vertex in the shared vertex buffer
    pub vertex_start: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// First index in the shared index buffer
    pub index_start: u32,
    /// Number of indices, zero for non-indexed draws
    pub index_count: u32,
    /// Material texture slots
    pub textures: MeshTextures,
}

impl Mesh {
    /// Whether the mesh draws through the index buffer
    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }
}
