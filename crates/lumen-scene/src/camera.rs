//! The scene's viewing camera

use glam::{Mat4, Vec3};
use lumen_core::Extent;

/// Perspective camera looking at a fixed point in the room
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    aspect_ratio: f32,
}

impl SceneCamera {
    pub fn new(position: Vec3, target: Vec3, fov_degrees: f32, viewport: Extent) -> Self {
        Self {
            position,
            target,
            fov_degrees,
            aspect_ratio: viewport.aspect_ratio(),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Follow a viewport resize
    pub fn set_viewport(&mut self, viewport: Extent) {
        self.aspect_ratio = viewport.aspect_ratio();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect_ratio, 0.1, 100.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, 1.8, 4.5),
            Vec3::new(0.0, 1.0, 0.0),
            50.0,
            Extent::new(1280, 720),
        )
    }
}
