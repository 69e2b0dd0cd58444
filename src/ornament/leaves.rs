//! Leaves: flat cards scattered over the cone.
//!
//! Leaves blend their orientation per Euler axis on the raw progress value
//! rather than slerping on the eased one, which gives them a looser, fluttery
//! settle than the rigid ornaments.

use super::{InstanceTransform, Instanced};
use crate::config::{LeavesConfig, TreeConfig};
use crate::mesh::Mesh;
use crate::progress::{ramp_above, Mode, Progress};
use crate::record::{EntityRecord, InstanceDescriptor, Population};
use glam::{EulerRot, Quat, Vec3};

/// Raw progress above which formed leaves flutter.
pub const LEAF_FLUTTER_THRESHOLD: f32 = 0.9;
/// Forward tilt of a formed leaf, radians.
const LEAF_TILT: f32 = 0.35;

/// Orientation of a leaf as (pitch, yaw, roll).
pub fn leaf_euler(record: &EntityRecord<InstanceDescriptor>, raw: f32, time: f32) -> Vec3 {
    let p = &record.params;
    let spin = time * p.speed;
    let chaos = Vec3::new(
        spin + p.phase,
        spin * 0.7 + p.phase * 2.0,
        spin * 0.4 - p.phase,
    );

    let target = record.target();
    let yaw = target.x.atan2(target.z);
    let flutter = ramp_above(raw, LEAF_FLUTTER_THRESHOLD) * (time * 2.2 * p.speed + p.phase).sin();
    let formed = Vec3::new(LEAF_TILT + flutter * 0.15, yaw, flutter * 0.1);

    chaos.lerp(formed, raw)
}

#[derive(Debug, Clone)]
pub struct LeafField {
    population: Population<InstanceDescriptor>,
    progress: Progress,
    transforms: Vec<InstanceTransform>,
}

impl LeafField {
    pub fn build(config: &LeavesConfig, tree: &TreeConfig, seed: u64) -> Self {
        if config.count == 0 {
            tracing::warn!("leaf field has no instances");
        }

        let surface = tree.cone.inflated(0.1);
        let [min_scale, max_scale] = config.scale_range;
        let population = Population::spawn(config.count, seed, |ctx| {
            let chaos = ctx.chaos_point(tree.chaos_radius);
            let target = ctx.cone_point(surface);
            let descriptor = InstanceDescriptor {
                phase: ctx.random_phase(),
                speed: ctx.random_range(0.6, 1.8),
                color: ctx
                    .pick(&config.palette)
                    .map(|c| c.linear())
                    .unwrap_or(Vec3::ONE),
                scale: ctx.random_range(min_scale, max_scale),
                axis: Vec3::Y,
            };
            (chaos, target, descriptor)
        });

        let mut leaves = Self {
            population,
            progress: Progress::new(config.damping),
            transforms: Vec::new(),
        };
        leaves.transforms = leaves.compute(0.0);
        leaves
    }

    fn compute(&self, time: f32) -> Vec<InstanceTransform> {
        let raw = self.progress.raw();
        let eased = self.progress.eased();
        self.population
            .iter()
            .map(|record| {
                let e = leaf_euler(record, raw, time);
                InstanceTransform {
                    position: record.position_at(eased),
                    rotation: Quat::from_euler(EulerRot::YXZ, e.y, e.x, e.z),
                    scale: Vec3::splat(record.params.scale),
                    color: record.params.color,
                    emissive: 0.0,
                }
            })
            .collect()
    }
}

impl Instanced for LeafField {
    fn label(&self) -> &str {
        "leaves"
    }

    fn mesh(&self) -> Mesh {
        Mesh::cuboid(Vec3::new(0.35, 0.5, 0.03))
    }

    fn update(&mut self, mode: Mode, dt: f32, time: f32) {
        if self.population.is_empty() {
            return;
        }
        self.progress = self.progress.advance(mode, dt);
        self.transforms = self.compute(time);
    }

    fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
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

    #[test]
    fn test_euler_endpoints() {
        let record = EntityRecord::new(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 1.0),
            InstanceDescriptor::default(),
        );
        let formed = leaf_euler(&record, 1.0, 0.0);
        assert!((formed.y - std::f32::consts::FRAC_PI_4).abs() < 1e-5);

        let chaos = leaf_euler(&record, 0.0, 2.0);
        assert!((chaos.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_flutter_at_threshold() {
        let record = EntityRecord::new(Vec3::ZERO, Vec3::Z, InstanceDescriptor::default());
        let e = leaf_euler(&record, LEAF_FLUTTER_THRESHOLD, 1.3);
        let expected_x =
            1.3 * (1.0 - LEAF_FLUTTER_THRESHOLD) + LEAF_TILT * LEAF_FLUTTER_THRESHOLD;
        assert!((e.x - expected_x).abs() < 1e-4);
    }

    #[test]
    fn test_leaf_scales_in_range() {
        let scene = SceneConfig::for_theme(Theme::Icy);
        let leaves = LeafField::build(&scene.leaves, &scene.tree, 11);
        let [lo, hi] = scene.leaves.scale_range;
        for t in leaves.transforms() {
            assert!(t.scale.x >= lo && t.scale.x <= hi);
        }
    }
}
