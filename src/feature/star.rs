//! Star topper.
//!
//! Follows the same chaos-to-formed contract as the ornaments, with a
//! continuous decorative spin on top and a scale that shrinks while
//! scattered, so the star visibly grows as the tree assembles.

use crate::config::{StarConfig, TreeConfig};
use crate::mesh::Mesh;
use crate::ornament::{transition_pulse, tumble, InstanceTransform, Instanced};
use crate::progress::{ramp_above, Mode, Progress};
use crate::spawn::SpawnContext;
use glam::{Quat, Vec3};

/// Scale factor while fully chaotic.
pub const STAR_CHAOS_SCALE: f32 = 0.3;
/// Raw progress above which the star glows.
pub const STAR_GLOW_THRESHOLD: f32 = 0.9;
/// Radians per second of the decorative spin.
const STAR_SPIN_SPEED: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct Star {
    chaos: Vec3,
    target: Vec3,
    axis: Vec3,
    phase: f32,
    size: f32,
    color: Vec3,
    progress: Progress,
    transform: [InstanceTransform; 1],
}

impl Star {
    pub fn build(config: &StarConfig, tree: &TreeConfig, seed: u64) -> Self {
        let mut ctx = SpawnContext::new(0, 1, seed);
        let target = Vec3::new(0.0, tree.cone.apex_y() + config.size * 0.4, 0.0);
        let mut star = Self {
            chaos: ctx.chaos_point(tree.chaos_radius),
            target,
            axis: ctx.random_axis(),
            phase: ctx.random_phase(),
            size: config.size,
            color: config.color.linear(),
            progress: Progress::new(config.damping),
            transform: [InstanceTransform {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
                color: Vec3::ONE,
                emissive: 0.0,
            }],
        };
        star.transform[0] = star.compute(0.0);
        star
    }

    #[inline]
    pub fn chaos(&self) -> Vec3 {
        self.chaos
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Scale growth factor at eased progress, ignoring pulses.
    #[inline]
    pub fn growth(eased: f32) -> f32 {
        STAR_CHAOS_SCALE + (1.0 - STAR_CHAOS_SCALE) * eased
    }

    fn compute(&self, time: f32) -> InstanceTransform {
        let raw = self.progress.raw();
        let eased = self.progress.eased();

        let settle = tumble(self.axis, 0.6, self.phase, time).slerp(Quat::IDENTITY, eased);
        let spin = Quat::from_rotation_y(time * STAR_SPIN_SPEED + self.phase);

        let glow = ramp_above(raw, STAR_GLOW_THRESHOLD);
        let beat = (time * 4.0).sin();
        let pulse = transition_pulse(raw) * (1.0 + 0.1 * beat * glow);

        InstanceTransform {
            position: self.chaos.lerp(self.target, eased),
            rotation: settle * spin,
            scale: Vec3::splat(self.size * Self::growth(eased) * pulse),
            color: self.color,
            emissive: 1.5 * (0.8 + 0.2 * beat) * glow,
        }
    }
}

impl Instanced for Star {
    fn label(&self) -> &str {
        "star"
    }

    fn mesh(&self) -> Mesh {
        Mesh::star_prism(5, 0.5, 0.22, 0.14)
    }

    fn update(&mut self, mode: Mode, dt: f32, time: f32) {
        self.progress = self.progress.advance(mode, dt);
        self.transform[0] = self.compute(time);
    }

    fn transforms(&self) -> &[InstanceTransform] {
        &self.transform
    }

    fn progress(&self) -> Progress {
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::theme::Theme;

    fn star() -> Star {
        let scene = SceneConfig::for_theme(Theme::Classic);
        Star::build(&scene.star, &scene.tree, 77)
    }

    #[test]
    fn test_star_small_in_chaos() {
        let s = star();
        let t = s.transforms()[0];
        assert!((t.scale.x - s.size * STAR_CHAOS_SCALE).abs() < 1e-5);
        assert_eq!(t.position, s.chaos());
        assert_eq!(t.emissive, 0.0);
    }

    #[test]
    fn test_star_grows_and_glows_when_formed() {
        let mut s = star();
        for step in 0..2400 {
            s.update(Mode::Formed, 1.0 / 60.0, step as f32 / 60.0);
        }
        let t = s.transforms()[0];
        assert!((t.position - s.target()).length() < 1e-3);
        assert!(t.scale.x > s.size * 0.85);
        assert!(t.emissive > 0.0);
    }

    #[test]
    fn test_star_keeps_spinning_when_formed() {
        let mut s = star();
        for step in 0..2400 {
            s.update(Mode::Formed, 1.0 / 60.0, step as f32 / 60.0);
        }
        let before = s.transforms()[0].rotation;
        s.update(Mode::Formed, 1.0 / 60.0, 41.0);
        let after = s.transforms()[0].rotation;
        assert!(before.angle_between(after) > 0.1);
    }

    #[test]
    fn test_star_sits_above_apex() {
        let scene = SceneConfig::for_theme(Theme::Icy);
        let s = Star::build(&scene.star, &scene.tree, 1);
        assert!(s.target().y > scene.tree.cone.apex_y());
    }
}
