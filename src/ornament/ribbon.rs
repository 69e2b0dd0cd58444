//! Ribbon: short box segments laid end to end along a spiral around the cone.

use super::{tumble, InstanceTransform, Instanced};
use crate::config::{RibbonConfig, TreeConfig};
use crate::distribution::ConeShape;
use crate::mesh::Mesh;
use crate::progress::{ramp_above, Mode, Progress};
use crate::record::{InstanceDescriptor, Population};
use glam::{Quat, Vec3};
use std::f32::consts::TAU;

/// Raw progress above which the formed ribbon ripples.
pub const RIBBON_RIPPLE_THRESHOLD: f32 = 0.85;
/// Top of the spiral as a fraction of tree height.
const RIBBON_TOP: f32 = 0.92;

/// A point on the ribbon path at `t` in [0, 1].
fn path_point(cone: ConeShape, turns: f32, t: f32) -> Vec3 {
    let fraction = t * RIBBON_TOP;
    cone.surface_point(fraction, fraction * turns * TAU)
}

#[derive(Debug, Clone)]
pub struct RibbonField {
    population: Population<InstanceDescriptor>,
    /// Formed orientation and scale of each segment.
    formed: Vec<(Quat, Vec3)>,
    progress: Progress,
    transforms: Vec<InstanceTransform>,
}

impl RibbonField {
    pub fn build(config: &RibbonConfig, tree: &TreeConfig, seed: u64) -> Self {
        let path = tree.cone.inflated(0.35);
        let segments = config.segments;
        let color = config.color.linear();

        let population = Population::spawn(segments, seed, |ctx| {
            let chaos = ctx.chaos_point(tree.chaos_radius);
            let t = (ctx.index as f32 + 0.5) / segments as f32;
            let descriptor = InstanceDescriptor {
                phase: ctx.random_phase(),
                speed: ctx.random_range(0.5, 1.2),
                color,
                scale: 1.0,
                axis: ctx.random_axis(),
            };
            (chaos, path_point(path, config.turns, t), descriptor)
        });

        let formed = (0..segments)
            .map(|i| {
                let a = path_point(path, config.turns, i as f32 / segments as f32);
                let b = path_point(path, config.turns, (i + 1) as f32 / segments as f32);
                let along = b - a;
                let rotation = along
                    .try_normalize()
                    .map(|dir| Quat::from_rotation_arc(Vec3::X, dir))
                    .unwrap_or(Quat::IDENTITY);
                // Overlap neighbours a little so the ribbon reads as continuous.
                let scale = Vec3::new(along.length() * 1.1, config.width, config.width * 0.25);
                (rotation, scale)
            })
            .collect();

        let mut ribbon = Self {
            population,
            formed,
            progress: Progress::new(config.damping),
            transforms: Vec::new(),
        };
        ribbon.transforms = ribbon.compute(0.0);
        ribbon
    }

    fn compute(&self, time: f32) -> Vec<InstanceTransform> {
        let raw = self.progress.raw();
        let eased = self.progress.eased();
        let ripple = ramp_above(raw, RIBBON_RIPPLE_THRESHOLD);
        self.population
            .iter()
            .zip(&self.formed)
            .enumerate()
            .map(|(i, (record, &(formed_rot, scale)))| {
                let p = &record.params;
                let mut position = record.position_at(eased);
                position.y += (time * 2.0 + i as f32 * 0.3).sin() * 0.03 * ripple;

                let chaos_rot = tumble(p.axis, p.speed, p.phase, time);
                InstanceTransform {
                    position,
                    rotation: chaos_rot.slerp(formed_rot, eased),
                    scale,
                    color: p.color,
                    emissive: 0.0,
                }
            })
            .collect()
    }
}

impl Instanced for RibbonField {
    fn label(&self) -> &str {
        "ribbon"
    }

    fn mesh(&self) -> Mesh {
        Mesh::cuboid(Vec3::splat(0.5))
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
