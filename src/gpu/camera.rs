//! Orbit camera around the tree.

use glam::{Mat4, Vec3};

/// Vertical field of view in radians.
const FOV_Y: f32 = 0.785_398_2;
const NEAR: f32 = 0.1;
const FAR: f32 = 250.0;
const MIN_DISTANCE: f32 = 8.0;
const MAX_DISTANCE: f32 = 90.0;
/// Keeps the camera off the poles, where `look_at` degenerates.
const PITCH_LIMIT: f32 = 1.45;

/// Orbit camera driven by mouse drag and wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.12,
            distance: 34.0,
            target: Vec3::new(0.0, 1.0, 0.0),
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y, aspect.max(1e-3), NEAR, FAR)
    }

    /// Rotate by a mouse drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Zoom by wheel lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance * (1.0 - lines * 0.08)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_distance() {
        let cam = Camera::new();
        assert!(((cam.position() - cam.target).length() - cam.distance).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = Camera::new();
        cam.orbit(0.0, 10_000.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.orbit(0.0, -20_000.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = Camera::new();
        for _ in 0..100 {
            cam.zoom(5.0);
        }
        assert_eq!(cam.distance, MIN_DISTANCE);
        for _ in 0..100 {
            cam.zoom(-5.0);
        }
        assert_eq!(cam.distance, MAX_DISTANCE);
    }
}
