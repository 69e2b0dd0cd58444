//! Point fields: large homogeneous populations interpolated on the GPU.
//!
//! A point field uploads one attribute buffer at build time (chaos position,
//! target position, color, seed and size per point) and afterwards sends a
//! single progress value per frame. The vertex shader evaluates
//! `mix(chaos, target, ease_out_cubic(progress))` plus the field's
//! decorations. [`PointField::rendered_point`] is the CPU reference of the
//! same formula; it is what the tests check and what a non-GPU backend would
//! call.
//!
//! # Variants
//!
//! | Kind | Target | Decoration |
//! |------|--------|------------|
//! | Foliage | cone surface, slightly thickened | size pulse, gentle bob |
//! | Glitter | shell just outside the cone | strong twinkle |
//! | Lights | spiral string around the cone | twinkle, intermittent flash |
//! | Snow | ground disk, landing jitter baked in | slow bob |

mod shader;

pub use shader::point_field_shader;

use crate::config::{PointFieldConfig, PointFieldKind, TreeConfig};
use crate::progress::{ease_out_cubic, Mode, Progress};
use crate::record::Population;
use crate::spawn::SpawnContext;
use bytemuck::{Pod, Zeroable};
use chaos_tree_derive::PointAttributes;
use glam::Vec3;
use std::f32::consts::TAU;

/// Vertex attribute layout of a per-point struct.
///
/// Implemented by `#[derive(PointAttributes)]`; do not implement by hand.
pub trait PointLayout: Pod {
    /// Attribute table for `wgpu::VertexBufferLayout`.
    const ATTRIBUTES: &'static [wgpu::VertexAttribute];
    /// Byte size of one point.
    const STRIDE: u64;
    /// WGSL `PointInput` struct with matching `@location`s.
    const WGSL_INPUT: &'static str;

    /// Instance-stepped buffer layout for this struct.
    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: Self::ATTRIBUTES,
        }
    }
}

/// Per-point data uploaded once per field.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, PointAttributes)]
pub struct PointVertex {
    pub chaos_pos: Vec3,
    pub target_pos: Vec3,
    pub color: Vec3,
    /// Random value in [0, 1), drives every per-point phase.
    pub seed: f32,
    /// Size multiplier around the field's base size.
    pub size: f32,
}

/// Per-field uniform, rewritten once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub progress: f32,
    pub base_size: f32,
    pub _pad: [f32; 2],
}

/// Decorative per-point motion, baked into the field's shader as constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEffects {
    /// Relative size oscillation amplitude.
    pub pulse: f32,
    pub pulse_speed: f32,
    /// Alpha dip amplitude in [0, 1].
    pub twinkle: f32,
    pub twinkle_speed: f32,
    /// Flash cycles per second; 0 disables flashing.
    pub flash_rate: f32,
    /// Fraction of each flash cycle spent dark.
    pub flash_threshold: f32,
    /// Size multiplier added while flashing.
    pub flash_boost: f32,
    /// Vertical bob amplitude, scaled by raw progress.
    pub bob: f32,
    pub bob_speed: f32,
}

impl FieldEffects {
    pub fn for_kind(kind: PointFieldKind) -> Self {
        let base = FieldEffects {
            pulse: 0.0,
            pulse_speed: 0.0,
            twinkle: 0.0,
            twinkle_speed: 0.0,
            flash_rate: 0.0,
            flash_threshold: 1.0,
            flash_boost: 0.0,
            bob: 0.0,
            bob_speed: 0.0,
        };
        match kind {
            PointFieldKind::Foliage => FieldEffects {
                pulse: 0.25,
                pulse_speed: 2.0,
                twinkle: 0.2,
                twinkle_speed: 1.5,
                bob: 0.04,
                bob_speed: 1.2,
                ..base
            },
            PointFieldKind::Glitter => FieldEffects {
                pulse: 0.4,
                pulse_speed: 3.0,
                twinkle: 0.8,
                twinkle_speed: 4.0,
                bob: 0.06,
                bob_speed: 0.8,
                ..base
            },
            PointFieldKind::Lights => FieldEffects {
                pulse: 0.15,
                pulse_speed: 1.0,
                twinkle: 0.5,
                twinkle_speed: 2.5,
                flash_rate: 0.35,
                flash_threshold: 0.94,
                flash_boost: 1.5,
                bob: 0.03,
                bob_speed: 1.0,
                ..base
            },
            PointFieldKind::Snow => FieldEffects {
                twinkle: 0.3,
                twinkle_speed: 0.7,
                bob: 0.02,
                bob_speed: 0.5,
                ..base
            },
        }
    }
}

/// CPU evaluation of one point, identical to the vertex shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedPoint {
    pub position: Vec3,
    pub size: f32,
    pub alpha: f32,
    pub flashing: bool,
}

/// Spiral turns of the light string, base to apex.
const LIGHT_TURNS: f32 = 7.0;
/// Maximum height snow settles above the ground.
const SNOW_LANDING_JITTER: f32 = 0.15;

#[derive(Debug, Clone, Copy)]
struct PointParams {
    seed: f32,
    size: f32,
    color: Vec3,
}

/// One animated point population.
#[derive(Debug, Clone)]
pub struct PointField {
    kind: PointFieldKind,
    vertices: Vec<PointVertex>,
    effects: FieldEffects,
    base_size: f32,
    progress: Progress,
}

impl PointField {
    /// Build the population. Chaos homes and targets are fixed from here on.
    pub fn build(config: &PointFieldConfig, tree: &TreeConfig, seed: u64) -> Self {
        let population = Population::spawn(config.count, seed, |ctx| {
            let chaos = ctx.chaos_point(tree.chaos_radius);
            let target = point_target(config.kind, tree, ctx);
            let params = PointParams {
                seed: ctx.random(),
                size: ctx.random_range(0.6, 1.4),
                color: ctx
                    .pick(&config.palette)
                    .map(|c| c.linear())
                    .unwrap_or(Vec3::ONE),
            };
            (chaos, target, params)
        });

        let vertices = population
            .iter()
            .map(|record| PointVertex {
                chaos_pos: record.chaos(),
                target_pos: record.target(),
                color: record.params.color,
                seed: record.params.seed,
                size: record.params.size,
            })
            .collect();

        Self {
            kind: config.kind,
            vertices,
            effects: FieldEffects::for_kind(config.kind),
            base_size: config.size,
            progress: Progress::new(config.damping),
        }
    }

    /// Advance this field's progress by one frame.
    pub fn update(&mut self, mode: Mode, dt: f32) {
        self.progress = self.progress.advance(mode, dt);
    }

    #[inline]
    pub fn kind(&self) -> PointFieldKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn effects(&self) -> &FieldEffects {
        &self.effects
    }

    /// Attribute buffer contents.
    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    /// The uniform sent to the GPU this frame.
    pub fn uniforms(&self) -> FieldUniforms {
        FieldUniforms {
            progress: self.progress.raw(),
            base_size: self.base_size,
            _pad: [0.0; 2],
        }
    }

    /// Vertex shader for this field.
    pub fn shader_source(&self) -> String {
        point_field_shader(&self.effects)
    }

    /// Plain chaos-to-target interpolation of point `index`, no decoration.
    pub fn interpolated_position(&self, index: usize) -> Option<Vec3> {
        self.vertices
            .get(index)
            .map(|v| v.chaos_pos.lerp(v.target_pos, self.progress.eased()))
    }

    /// Full per-point evaluation at `time`, matching the shader.
    pub fn rendered_point(&self, index: usize, time: f32) -> Option<RenderedPoint> {
        let v = self.vertices.get(index)?;
        Some(evaluate_point(
            v,
            self.progress.raw(),
            self.base_size,
            time,
            &self.effects,
        ))
    }
}

/// Shader formula on the CPU. Keep in sync with `shader.rs`.
pub fn evaluate_point(
    v: &PointVertex,
    progress: f32,
    base_size: f32,
    time: f32,
    fx: &FieldEffects,
) -> RenderedPoint {
    let t = ease_out_cubic(progress);
    let phase = v.seed * TAU;

    let mut position = v.chaos_pos.lerp(v.target_pos, t);
    position.y += (time * fx.bob_speed + phase).sin() * fx.bob * progress;

    let mut size = base_size * v.size * (1.0 + fx.pulse * (time * fx.pulse_speed + phase).sin());
    let mut alpha =
        1.0 - fx.twinkle * (0.5 + 0.5 * (time * fx.twinkle_speed + phase * 3.0).sin());

    let cycle = time * fx.flash_rate + v.seed * 7.31;
    let flashing = fx.flash_rate > 0.0 && (cycle - cycle.floor()) > fx.flash_threshold;
    if flashing {
        size *= 1.0 + fx.flash_boost;
        alpha = 1.0;
    }

    RenderedPoint {
        position,
        size,
        alpha,
        flashing,
    }
}

fn point_target(kind: PointFieldKind, tree: &TreeConfig, ctx: &mut SpawnContext) -> Vec3 {
    let cone = tree.cone;
    match kind {
        PointFieldKind::Foliage => {
            let p = ctx.cone_point(cone);
            // Thicken the shell inward so the foliage has depth.
            let depth = ctx.random_range(0.82, 1.0);
            Vec3::new(p.x * depth, p.y, p.z * depth)
        }
        PointFieldKind::Glitter => ctx.cone_point(cone.inflated(0.25)),
        PointFieldKind::Lights => {
            let along = (ctx.progress() + ctx.random_range(-0.002, 0.002)).clamp(0.0, 0.97);
            let azimuth = along * LIGHT_TURNS * TAU;
            cone.inflated(0.12).surface_point(along, azimuth)
        }
        PointFieldKind::Snow => {
            let radius = tree.chaos_radius * 0.6 * ctx.random().sqrt();
            let angle = ctx.random_phase();
            let landing = ctx.random_range(0.0, SNOW_LANDING_JITTER);
            Vec3::new(
                radius * angle.cos(),
                cone.y_offset + landing,
                radius * angle.sin(),
            )
        }
    }
}
