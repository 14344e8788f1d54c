//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the few helpers the renderer needs.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Decomposed local transform (translation, rotation, scale)
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,
    /// Rotation quaternion
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from glTF-style arrays: translation, rotation `[x, y, z, w]`, scale
    pub fn from_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let [x, y, z, w] = rotation;
        Self {
            position: Vec3::from(translation),
            rotation: Quat::from_quaternion(Quaternion::new(w, x, y, z)),
            scale: Vec3::from(scale),
        }
    }

    /// Compose into a matrix, `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Build a matrix from column-major storage (glTF, GLSL layout)
pub fn mat4_from_columns(columns: [[f32; 4]; 4]) -> Mat4 {
    let flat: Vec<f32> = columns.iter().flatten().copied().collect();
    Mat4::from_column_slice(&flat)
}

/// Inverse-transpose of `model`, used to transform normals.
///
/// Singular matrices fall back to identity.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model.try_inverse().map_or_else(Mat4::identity, |inv| inv.transpose())
}
