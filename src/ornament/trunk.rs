//! Trunk: stacked cylinder segments assembling along the tree axis.

use super::{tumble, InstanceTransform, Instanced};
use crate::config::{TreeConfig, TrunkConfig};
use crate::mesh::Mesh;
use crate::progress::{Mode, Progress};
use crate::record::{InstanceDescriptor, Population};
use glam::{Quat, Vec3};

/// Share of the tree height the trunk reaches into the foliage.
const TRUNK_REACH: f32 = 0.3;
/// Radius lost between the lowest and highest segment.
const TRUNK_TAPER: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct TrunkField {
    population: Population<InstanceDescriptor>,
    /// Formed (radius, height) scale of each segment.
    segment_scale: Vec<Vec3>,
    progress: Progress,
    transforms: Vec<InstanceTransform>,
}

impl TrunkField {
    pub fn build(config: &TrunkConfig, tree: &TreeConfig, seed: u64) -> Self {
        let segments = config.segments;
        let bottom = tree.cone.y_offset - config.below_base;
        let top = tree.cone.y_offset + tree.cone.height * TRUNK_REACH;
        let segment_height = if segments == 0 {
            0.0
        } else {
            (top - bottom) / segments as f32
        };
        let color = config.color.linear();

        let population = Population::spawn(segments, seed, |ctx| {
            let chaos = ctx.chaos_point(tree.chaos_radius);
            let target = Vec3::new(0.0, bottom + segment_height * (ctx.index as f32 + 0.5), 0.0);
            let descriptor = InstanceDescriptor {
                phase: ctx.random_phase(),
                speed: ctx.random_range(0.3, 0.8),
                color,
                scale: 1.0 - TRUNK_TAPER * ctx.progress(),
                axis: ctx.random_axis(),
            };
            (chaos, target, descriptor)
        });

        // Segments overlap slightly so no seam shows once formed.
        let segment_scale = population
            .iter()
            .map(|r| {
                let diameter = config.radius * 2.0 * r.params.scale;
                Vec3::new(diameter, segment_height * 1.04, diameter)
            })
            .collect();

        let mut trunk = Self {
            population,
            segment_scale,
            progress: Progress::new(config.damping),
            transforms: Vec::new(),
        };
        trunk.transforms = trunk.compute(0.0);
        trunk
    }

    fn compute(&self, time: f32) -> Vec<InstanceTransform> {
        let eased = self.progress.eased();
        self.population
            .iter()
            .zip(&self.segment_scale)
            .map(|(record, &scale)| {
                let p = &record.params;
                let chaos_rot = tumble(p.axis, p.speed, p.phase, time);
                InstanceTransform {
                    position: record.position_at(eased),
                    rotation: chaos_rot.slerp(Quat::IDENTITY, eased),
                    scale,
                    color: p.color,
                    emissive: 0.0,
                }
            })
            .collect()
    }
}

impl Instanced for TrunkField {
    fn label(&self) -> &str {
        "trunk"
    }

    fn mesh(&self) -> Mesh {
        Mesh::cylinder(0.5, 1.0, 16)
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
    fn test_formed_trunk_is_a_column() {
        let scene = SceneConfig::for_theme(Theme::Classic);
        let mut trunk = TrunkField::build(&scene.trunk, &scene.tree, 5);
        for step in 0..3600 {
            trunk.update(Mode::Formed, 1.0 / 60.0, step as f32 / 60.0);
        }

        let transforms = trunk.transforms();
        assert_eq!(transforms.len(), scene.trunk.segments);
        for pair in transforms.windows(2) {
            assert!(pair[1].position.y > pair[0].position.y);
            assert!(pair[1].scale.x <= pair[0].scale.x);
        }
        for t in transforms {
            assert!(Vec3::new(t.position.x, 0.0, t.position.z).length() < 1e-3);
            assert!(t.rotation.angle_between(Quat::IDENTITY) < 1e-2);
        }
    }

    #[test]
    fn test_base_below_tree() {
        let scene = SceneConfig::for_theme(Theme::Classic);
        let trunk = TrunkField::build(&scene.trunk, &scene.tree, 5);
        let lowest = trunk
            .population
            .iter()
            .map(|r| r.target().y)
            .fold(f32::MAX, f32::min);
        assert!(lowest < scene.tree.cone.y_offset);
    }

    #[test]
    fn test_no_segments() {
        let scene = SceneConfig::for_theme(Theme::Classic);
        let mut config = scene.trunk.clone();
        config.segments = 0;
        let mut trunk = TrunkField::build(&config, &scene.tree, 5);
        trunk.update(Mode::Formed, 0.1, 0.0);
        assert!(trunk.is_empty());
    }
}
