//! Spawn context for building instance descriptors.
//!
//! Every population draws its randomized constants exactly once, when it is
//! built. `SpawnContext` bundles the slot index, the population size and an
//! RNG so factories stay short:
//!
//! ```ignore
//! let descriptor = |ctx: &mut SpawnContext| InstanceDescriptor {
//!     phase: ctx.random_phase(),
//!     speed: ctx.random_range(0.5, 1.5),
//!     color: ctx.pick(&palette).unwrap_or(Vec3::ONE),
//!     scale: ctx.random_range(0.25, 0.4),
//!     axis: ctx.random_axis(),
//! };
//! ```

use crate::distribution::{cone_surface_point, uniform_ball_point, ConeShape};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Context handed to descriptor factories, one slot at a time.
pub struct SpawnContext {
    /// Index of the slot being spawned (0 to count-1).
    pub index: usize,
    /// Total number of slots in the population.
    pub count: usize,
    rng: SmallRng,
}

impl SpawnContext {
    /// Context driven by a caller-owned seed.
    ///
    /// Populations seed from entropy in production; tests pass fixed seeds.
    pub fn new(index: usize, count: usize, seed: u64) -> Self {
        Self {
            index,
            count,
            rng: SmallRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        }
    }

    /// Normalized position of this slot in the population (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.index as f32 / self.count as f32
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max]`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Random phase offset in `[0, TAU)`.
    #[inline]
    pub fn random_phase(&mut self) -> f32 {
        self.rng.gen::<f32>() * TAU
    }

    /// Random unit vector.
    pub fn random_axis(&mut self) -> Vec3 {
        let v = uniform_ball_point(&mut self.rng, 1.0);
        v.try_normalize().unwrap_or(Vec3::Y)
    }

    /// Pick one entry uniformly. Returns `None` for an empty slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.rng.gen_range(0..items.len())])
    }

    /// Random chaos home inside a ball.
    pub fn chaos_point(&mut self, radius: f32) -> Vec3 {
        uniform_ball_point(&mut self.rng, radius)
    }

    /// Random point on a cone surface.
    pub fn cone_point(&mut self, cone: ConeShape) -> Vec3 {
        cone_surface_point(&mut self.rng, cone)
    }
}

/// Fresh population seed from the OS entropy source.
///
/// Randomness is per population lifetime, not reproducible across runs.
pub fn entropy_seed() -> u64 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = SpawnContext::new(3, 10, 99);
        let mut b = SpawnContext::new(3, 10, 99);
        assert_eq!(a.random(), b.random());
        assert_eq!(a.random_axis(), b.random_axis());
    }

    #[test]
    fn test_slots_differ() {
        let mut a = SpawnContext::new(0, 10, 99);
        let mut b = SpawnContext::new(1, 10, 99);
        assert_ne!(a.random(), b.random());
    }

    #[test]
    fn test_random_range_bounds() {
        let mut ctx = SpawnContext::new(0, 1, 5);
        for _ in 0..1000 {
            let v = ctx.random_range(0.25, 0.4);
            assert!((0.25..=0.4).contains(&v));
        }
        assert_eq!(ctx.random_range(0.3, 0.3), 0.3);
    }

    #[test]
    fn test_pick_empty() {
        let mut ctx = SpawnContext::new(0, 1, 5);
        let empty: [u8; 0] = [];
        assert_eq!(ctx.pick(&empty), None);
        assert_eq!(ctx.pick(&[7]), Some(7));
    }

    #[test]
    fn test_axis_is_unit() {
        let mut ctx = SpawnContext::new(0, 1, 8);
        for _ in 0..100 {
            assert!((ctx.random_axis().length() - 1.0).abs() < 1e-4);
        }
    }
}
