//! Uniform buffer layouts shared with the shaders

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{normal_matrix, Mat4, Vec3};

/// Camera block at binding 0, written every frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// World to view
    pub view: [[f32; 4]; 4],
    /// View to clip, Vulkan conventions
    pub proj: [[f32; 4]; 4],
    /// Eye position, `w` unused
    pub position: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Mat4::identity().into();
        Self {
            view: identity,
            proj: identity,
            position: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl CameraUniform {
    /// Fill from matrices and the eye position
    pub fn new(view: &Mat4, proj: &Mat4, position: &Vec3) -> Self {
        Self {
            view: (*view).into(),
            proj: (*proj).into(),
            position: [position.x, position.y, position.z, 1.0],
        }
    }
}

/// Node block at binding 1
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeUniform {
    /// Object to world
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`
    pub normal: [[f32; 4]; 4],
}

impl NodeUniform {
    /// Block for a world transform
    pub fn from_world(world: &Mat4) -> Self {
        Self {
            model: (*world).into(),
            normal: normal_matrix(world).into(),
        }
    }
}
