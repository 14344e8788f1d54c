//! Fly camera
//!
//! Yaw/pitch camera driven by keyboard movement and mouse look. Produces a
//! right-handed look-at view matrix and a Vulkan projection (Y flipped,
//! depth in `0..=1`).

use crate::core::config::CameraConfig;
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::scene::CameraUniform;

/// Pitch limit in degrees, keeps the view from flipping over the poles
pub const PITCH_LIMIT: f32 = 89.0;

/// Keyboard movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    /// Along the view direction
    Forward,
    /// Against the view direction
    Backward,
    /// Against the right vector
    Left,
    /// Along the right vector
    Right,
}

/// Free-flying perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    /// Eye position in world space
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    /// Units per second
    pub speed: f32,
    /// Degrees per unit of mouse movement
    pub sensitivity: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl FlyCamera {
    /// Camera at the configured position looking down -Z
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: Vec3::from(config.position),
            front: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::from(config.up),
            right: Vec3::new(1.0, 0.0, 0.0),
            world_up: Vec3::from(config.up),
            yaw: -90.0,
            pitch: 0.0,
            speed: config.speed,
            sensitivity: config.sensitivity,
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
        };
        camera.update_vectors();
        camera
    }

    /// Unit view direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit up vector of the camera frame
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Heading in degrees; -90 looks down -Z
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Elevation in degrees, within `±PITCH_LIMIT`
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Move for `delta_seconds` in one direction
    pub fn process_movement(&mut self, direction: CameraMovement, delta_seconds: f32) {
        let distance = self.speed * delta_seconds;
        match direction {
            CameraMovement::Forward => self.position += self.front * distance,
            CameraMovement::Backward => self.position -= self.front * distance,
            CameraMovement::Left => self.position -= self.right * distance,
            CameraMovement::Right => self.position += self.right * distance,
        }
    }

    /// Turn by a mouse delta; positive `y_offset` looks up
    pub fn process_mouse(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }

    /// World to view
    pub fn view_matrix(&self) -> Mat4 {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.front);
        Mat4::look_at_rh(&eye, &target, &self.up)
    }

    /// View to clip for the given width over height
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        vulkan_perspective(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Fill a camera block for a `width` x `height` target
    pub fn update_uniform(&self, uniform: &mut CameraUniform, width: u32, height: u32) {
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        *uniform = CameraUniform::new(&self.view_matrix(), &self.projection_matrix(aspect), &self.position);
    }
}

/// Right-handed perspective with Y pointing down in clip space and depth
/// mapped to `0..=1`
#[rustfmt::skip]
pub fn vulkan_perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    Mat4::new(
        f / aspect, 0.0, 0.0, 0.0,
        0.0, -f, 0.0, 0.0,
        0.0, 0.0, far / (near - far), near * far / (near - far),
        0.0, 0.0, -1.0, 0.0,
    )
}
