//! Spatial distribution functions.
//!
//! Every animated entity has two homes: a point scattered in a ball (chaos)
//! and a point on the tree (formed). These generators produce both. They hold
//! no state; randomness comes from the caller's RNG so each population owns
//! its own stream.
//!
//! ```ignore
//! use chaos_tree::distribution::{cone_surface_point, uniform_ball_point, ConeShape};
//!
//! let mut rng = SmallRng::from_entropy();
//! let chaos = uniform_ball_point(&mut rng, 25.0);
//! let target = cone_surface_point(&mut rng, ConeShape::new(7.0, 16.0, -8.0));
//! ```

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Angular step between consecutive spiral slots (golden angle).
const SPIRAL_STEP: f32 = 2.399_963;
/// Quadratic azimuth term, spreads later turns apart.
const SPIRAL_SPREAD: f32 = 0.0015;
/// Amplitude of the deterministic per-slot height jitter.
const SPIRAL_JITTER: f32 = 0.06;

/// A right cone standing on the XZ plane at `y_offset`, apex pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConeShape {
    /// Radius of the base circle.
    pub base_radius: f32,
    /// Distance from base to apex.
    pub height: f32,
    /// Y coordinate of the base.
    pub y_offset: f32,
}

impl ConeShape {
    pub const fn new(base_radius: f32, height: f32, y_offset: f32) -> Self {
        Self {
            base_radius,
            height,
            y_offset,
        }
    }

    /// Y coordinate of the apex.
    #[inline]
    pub fn apex_y(&self) -> f32 {
        self.y_offset + self.height
    }

    /// Cone radius at a height fraction in [0, 1] (0 = base, 1 = apex).
    #[inline]
    pub fn radius_at(&self, fraction: f32) -> f32 {
        self.base_radius * (1.0 - fraction.clamp(0.0, 1.0))
    }

    /// Point on the lateral surface at a height fraction and azimuth.
    pub fn surface_point(&self, fraction: f32, azimuth: f32) -> Vec3 {
        let fraction = fraction.clamp(0.0, 1.0);
        let r = self.radius_at(fraction);
        Vec3::new(
            r * azimuth.cos(),
            self.y_offset + fraction * self.height,
            r * azimuth.sin(),
        )
    }

    /// Same cone grown outward by `margin` at every height.
    pub fn inflated(&self, margin: f32) -> Self {
        Self {
            base_radius: self.base_radius + margin,
            ..*self
        }
    }
}

/// Random point uniformly distributed by volume inside a sphere.
///
/// Azimuth is uniform, the polar angle is drawn as `acos(2v - 1)` so
/// directions are isotropic, and the radius is `radius * cbrt(u)` so density
/// is uniform per unit volume rather than per unit radius.
pub fn uniform_ball_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = radius * rng.gen::<f32>().cbrt();

    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.cos(),
        r * phi.sin() * theta.sin(),
    )
}

/// Random point on the lateral surface of a cone.
///
/// The height fraction is `1 - sqrt(u)`, which puts more samples near the
/// base where the circumference is larger, so the surface density stays
/// even instead of clustering at the apex.
pub fn cone_surface_point<R: Rng + ?Sized>(rng: &mut R, cone: ConeShape) -> Vec3 {
    let fraction = 1.0 - rng.gen::<f32>().sqrt();
    let azimuth = rng.gen::<f32>() * TAU;
    cone.surface_point(fraction, azimuth)
}

/// Deterministic slot on a cone, spiralling down from the top.
///
/// Slot `index` of `total` sits at height fraction `1 - index / total`
/// (nudged by a fixed per-index hash to break banding), with an azimuth
/// growing by the golden angle plus a small quadratic term. The same
/// `(index, total)` always yields the same point, so a slot keeps its
/// identity when entries elsewhere come and go.
pub fn spiral_slot_position(index: usize, total: usize, cone: ConeShape) -> Vec3 {
    let total = total.max(1) as f32;
    let i = index as f32;

    let jitter = (slot_hash(index) - 0.5) * SPIRAL_JITTER;
    // Keep clear of the apex, where the radius collapses to zero.
    let fraction = ((1.0 - i / total) * 0.9 + jitter).clamp(0.0, 0.95);
    let azimuth = i * SPIRAL_STEP + i * i * SPIRAL_SPREAD;

    cone.surface_point(fraction, azimuth)
}

/// Fixed trigonometric hash in [0, 1).
#[inline]
pub fn slot_hash(index: usize) -> f32 {
    let x = (index as f32 * 12.9898 + 78.233).sin() * 43_758.547;
    (x - x.floor()).min(0.999_999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const CONE: ConeShape = ConeShape::new(6.0, 14.0, -7.0);

    #[test]
    fn test_ball_points_stay_inside_radius() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let p = uniform_ball_point(&mut rng, 3.5);
            assert!(p.length() <= 3.5 + 1e-4);
        }
    }

    #[test]
    fn test_ball_is_uniform_by_volume() {
        let mut rng = SmallRng::seed_from_u64(42);
        let radius = 10.0;
        let samples = 100_000;
        let inner = (0..samples)
            .filter(|_| uniform_ball_point(&mut rng, radius).length() < radius / 2.0)
            .count();
        let fraction = inner as f32 / samples as f32;
        // Expect (1/2)^3 = 0.125; a radius-uniform sampler would give 0.5.
        assert!((fraction - 0.125).abs() < 0.01, "fraction = {}", fraction);
    }

    #[test]
    fn test_ball_is_isotropic() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mean = (0..50_000)
            .map(|_| uniform_ball_point(&mut rng, 1.0))
            .fold(Vec3::ZERO, |acc, p| acc + p)
            / 50_000.0;
        assert!(mean.length() < 0.02, "mean = {:?}", mean);
    }

    #[test]
    fn test_cone_points_within_height_band() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..10_000 {
            let p = cone_surface_point(&mut rng, CONE);
            assert!(p.y >= CONE.y_offset - 1e-4);
            assert!(p.y <= CONE.apex_y() + 1e-4);
        }
    }

    #[test]
    fn test_cone_radius_tapers_to_apex() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..10_000 {
            let p = cone_surface_point(&mut rng, CONE);
            let fraction = (p.y - CONE.y_offset) / CONE.height;
            let radial = Vec3::new(p.x, 0.0, p.z).length();
            assert!((radial - CONE.base_radius * (1.0 - fraction)).abs() < 1e-3);
        }
        let apex = CONE.surface_point(1.0, 0.7);
        assert!(glam::Vec2::new(apex.x, apex.z).length() < 1e-5);
    }

    #[test]
    fn test_cone_biased_toward_base() {
        let mut rng = SmallRng::seed_from_u64(9);
        let lower_half = (0..20_000)
            .filter(|_| cone_surface_point(&mut rng, CONE).y < CONE.y_offset + CONE.height / 2.0)
            .count();
        // P(1 - sqrt(u) < 0.5) = 0.75
        let fraction = lower_half as f32 / 20_000.0;
        assert!((fraction - 0.75).abs() < 0.02, "fraction = {}", fraction);
    }

    #[test]
    fn test_spiral_slots_are_deterministic() {
        for i in 0..20 {
            assert_eq!(spiral_slot_position(i, 20, CONE), spiral_slot_position(i, 20, CONE));
        }
    }

    #[test]
    fn test_spiral_slots_on_cone() {
        for i in 0..50 {
            let p = spiral_slot_position(i, 50, CONE);
            assert!(p.y >= CONE.y_offset - 1e-4 && p.y <= CONE.apex_y() + 1e-4);
        }
    }

    #[test]
    fn test_spiral_first_slot_highest() {
        let first = spiral_slot_position(0, 10, CONE);
        let last = spiral_slot_position(9, 10, CONE);
        assert!(first.y > last.y);
    }

    #[test]
    fn test_spiral_handles_zero_total() {
        let p = spiral_slot_position(0, 0, CONE);
        assert!(p.is_finite());
    }

    #[test]
    fn test_slot_hash_range() {
        for i in 0..1000 {
            let h = slot_hash(i);
            assert!((0.0..1.0).contains(&h));
        }
    }
}
