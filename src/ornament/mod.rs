//! Instanced rigid-body families.
//!
//! Unlike point fields, every instance here gets its full transform
//! recomputed on the CPU each frame, because each one carries its own
//! rotation logic. A family implements [`Instanced`] and the renderer draws
//! its [`Mesh`] once per transform.
//!
//! Per instance and frame:
//!
//! 1. Position is `lerp(chaos, target, eased)`.
//! 2. Rotation blends a chaos tumble and a formed "face outward + sway"
//!    orientation.
//! 3. Scale is the instance's base scale times a transition pulse, with an
//!    extra glow pulse for emissive families once nearly formed.
//! 4. Past a high progress threshold a small idle wobble keeps the formed
//!    tree from looking frozen.

mod leaves;
mod ribbon;
mod trunk;

pub use leaves::LeafField;
pub use ribbon::RibbonField;
pub use trunk::TrunkField;

use crate::config::{OrnamentFieldConfig, ShapeKind, TreeConfig};
use crate::mesh::Mesh;
use crate::progress::{ramp_above, Mode, Progress};
use crate::record::{EntityRecord, InstanceDescriptor, Population};
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::f32::consts::PI;

/// Damping of a weight-1.0 ornament field.
pub const ORNAMENT_BASE_DAMPING: f32 = 1.4;
/// Raw progress above which formed ornaments start their idle wobble.
pub const ORNAMENT_WOBBLE_THRESHOLD: f32 = 0.8;
/// Raw progress above which emissive ornaments glow and pulse.
pub const EMISSIVE_THRESHOLD: f32 = 0.9;

/// Resolved transform of one instance for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub color: Vec3,
    /// Emissive strength added to the lit color; 0 for non-emissive.
    pub emissive: f32,
}

impl InstanceTransform {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.model_matrix().to_cols_array_2d(),
            color: self.color.to_array(),
            emissive: self.emissive,
        }
    }
}

/// Per-instance GPU data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub emissive: f32,
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x3,
        8 => Float32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A population of rigid instances sharing one mesh.
pub trait Instanced {
    /// Name used in logs.
    fn label(&self) -> &str;

    /// Mesh every instance of this family draws.
    fn mesh(&self) -> Mesh;

    /// Advance progress and recompute every transform.
    fn update(&mut self, mode: Mode, dt: f32, time: f32);

    /// Transforms computed by the last `update`.
    fn transforms(&self) -> &[InstanceTransform];

    fn progress(&self) -> Progress;

    fn len(&self) -> usize {
        self.transforms().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Formed orientation: +Z faces away from the tree axis.
///
/// Equivalent to looking at the point twice as far from the axis at the
/// same height.
pub fn outward_rotation(position: Vec3) -> Quat {
    let look_at = Vec3::new(position.x * 2.0, position.y, position.z * 2.0);
    let dir = look_at - position;
    if dir.length_squared() < 1e-10 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(dir.x.atan2(dir.z))
}

/// Small hanging sway around the formed orientation.
pub fn sway(phase: f32, speed: f32, time: f32) -> Quat {
    let t = time * speed + phase;
    Quat::from_euler(EulerRot::XYZ, t.sin() * 0.08, 0.0, (t * 0.7).cos() * 0.05)
}

/// Continuous chaos tumble about a fixed axis.
pub fn tumble(axis: Vec3, speed: f32, phase: f32, time: f32) -> Quat {
    Quat::from_axis_angle(axis, time * speed + phase)
}

/// Styling shared by every instance of one ornament field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentStyle {
    pub geometry_scale: Vec3,
    /// Emissive intensity, `None` for non-emissive fields.
    pub emissive: Option<f32>,
}

/// Transition pulse: swells mid-flight, 1.0 at both endpoints.
#[inline]
pub fn transition_pulse(raw: f32) -> f32 {
    1.0 + 0.08 * (raw.clamp(0.0, 1.0) * PI).sin()
}

/// Transform of one ornament at `progress` and `time`.
pub fn ornament_transform(
    record: &EntityRecord<InstanceDescriptor>,
    progress: Progress,
    style: &OrnamentStyle,
    time: f32,
) -> InstanceTransform {
    let p = &record.params;
    let raw = progress.raw();
    let eased = progress.eased();

    let mut position = record.position_at(eased);
    let wobble = ramp_above(raw, ORNAMENT_WOBBLE_THRESHOLD);
    position.y += (time * 1.5 * p.speed + p.phase).sin() * 0.04 * wobble;

    let chaos_rot = tumble(p.axis, p.speed, p.phase, time);
    let formed_rot = outward_rotation(record.target()) * sway(p.phase, p.speed, time);
    let rotation = chaos_rot.slerp(formed_rot, eased);

    let mut pulse = transition_pulse(raw);
    let mut emissive = 0.0;
    if let Some(intensity) = style.emissive {
        let glow = ramp_above(raw, EMISSIVE_THRESHOLD);
        let beat = (time * 3.0 + p.phase).sin();
        pulse *= 1.0 + 0.12 * beat * glow;
        emissive = intensity * (0.75 + 0.25 * beat) * glow;
    }

    InstanceTransform {
        position,
        rotation,
        scale: style.geometry_scale * (p.scale * pulse),
        color: p.color,
        emissive,
    }
}

/// Config-driven ornament field (boxes, balls, bells, ...).
#[derive(Debug, Clone)]
pub struct OrnamentField {
    name: String,
    shape: ShapeKind,
    population: Population<InstanceDescriptor>,
    style: OrnamentStyle,
    progress: Progress,
    transforms: Vec<InstanceTransform>,
}

impl OrnamentField {
    pub fn build(config: &OrnamentFieldConfig, tree: &TreeConfig, seed: u64) -> Self {
        if config.count == 0 {
            tracing::warn!(field = %config.name, "ornament field has no instances");
        }

        let surface = tree.cone.inflated(0.2);
        let [min_scale, max_scale] = config.scale_range;
        let population = Population::spawn(config.count, seed, |ctx| {
            let chaos = ctx.chaos_point(tree.chaos_radius);
            let target = ctx.cone_point(surface);
            let descriptor = InstanceDescriptor {
                phase: ctx.random_phase(),
                speed: ctx.random_range(0.5, 1.5),
                color: ctx
                    .pick(&config.color_palette)
                    .map(|c| c.linear())
                    .unwrap_or(Vec3::ONE),
                scale: ctx.random_range(min_scale, max_scale),
                axis: ctx.random_axis(),
            };
            (chaos, target, descriptor)
        });

        let style = OrnamentStyle {
            geometry_scale: config.geometry_scale.unwrap_or(Vec3::ONE),
            emissive: config.emissive.then_some(config.emissive_intensity),
        };
        let progress = Progress::new(ORNAMENT_BASE_DAMPING * config.weight);
        let transforms = population
            .iter()
            .map(|r| ornament_transform(r, progress, &style, 0.0))
            .collect();

        Self {
            name: config.name.clone(),
            shape: config.shape,
            population,
            style,
            progress,
            transforms,
        }
    }

    #[inline]
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn style(&self) -> &OrnamentStyle {
        &self.style
    }

    pub fn population(&self) -> &Population<InstanceDescriptor> {
        &self.population
    }

    /// Base scale drawn for instance `index`, before any pulse.
    pub fn base_scale(&self, index: usize) -> Option<f32> {
        self.population.get(index).map(|r| r.params.scale)
    }
}

impl Instanced for OrnamentField {
    fn label(&self) -> &str {
        &self.name
    }

    fn mesh(&self) -> Mesh {
        Mesh::for_shape(self.shape)
    }

    fn update(&mut self, mode: Mode, dt: f32, time: f32) {
        if self.population.is_empty() {
            return;
        }
        self.progress = self.progress.advance(mode, dt);
        let (progress, style) = (self.progress, self.style);
        for (out, record) in self.transforms.iter_mut().zip(self.population.iter()) {
            *out = ornament_transform(record, progress, &style, time);
        }
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
    use crate::config::{Color, SceneConfig};
    use crate::theme::Theme;

    fn tree() -> TreeConfig {
        SceneConfig::for_theme(Theme::Classic).tree
    }

    fn bells() -> OrnamentFieldConfig {
        OrnamentFieldConfig::new("bell", ShapeKind::Cone, 60)
            .with_palette(vec![Color::rgb8(0xd4, 0xaf, 0x37)])
            .with_scale_range(0.25, 0.4)
    }

    fn run(field: &mut OrnamentField, mode: Mode, seconds: f32) {
        let dt = 1.0 / 60.0;
        let steps = (seconds / dt) as usize;
        for step in 0..steps {
            field.update(mode, dt, step as f32 * dt);
        }
    }

    #[test]
    fn test_outward_rotation_faces_away() {
        let p = Vec3::new(3.0, 1.0, -2.0);
        let facing = outward_rotation(p) * Vec3::Z;
        let away = Vec3::new(p.x, 0.0, p.z).normalize();
        assert!((facing - away).length() < 1e-5);
    }

    #[test]
    fn test_outward_rotation_on_axis() {
        assert_eq!(outward_rotation(Vec3::new(0.0, 4.0, 0.0)), Quat::IDENTITY);
    }

    #[test]
    fn test_transition_pulse_endpoints() {
        assert!((transition_pulse(0.0) - 1.0).abs() < 1e-6);
        assert!((transition_pulse(1.0) - 1.0).abs() < 1e-6);
        assert!(transition_pulse(0.5) > 1.0);
    }

    #[test]
    fn test_base_scale_within_range() {
        let field = OrnamentField::build(&bells(), &tree(), 42);
        assert_eq!(field.len(), 60);
        for i in 0..field.len() {
            let s = field.base_scale(i).unwrap();
            assert!((0.25..=0.4).contains(&s), "{}", s);
        }
    }

    #[test]
    fn test_zero_count_is_noop() {
        let config = OrnamentFieldConfig::new("none", ShapeKind::Box, 0);
        let mut field = OrnamentField::build(&config, &tree(), 1);
        field.update(Mode::Formed, 0.5, 1.0);
        assert!(field.is_empty());
        assert_eq!(field.progress().raw(), 0.0);
    }

    #[test]
    fn test_endpoints() {
        let mut field = OrnamentField::build(&bells(), &tree(), 7);
        run(&mut field, Mode::Chaos, 1.0);
        for (t, r) in field.transforms().iter().zip(field.population().iter()) {
            assert!((t.position - r.chaos()).length() < 1e-5);
        }

        run(&mut field, Mode::Formed, 30.0);
        for (t, r) in field.transforms().iter().zip(field.population().iter()) {
            // idle wobble is at most 0.04 vertically
            let d = t.position - r.target();
            assert!(Vec3::new(d.x, 0.0, d.z).length() < 1e-3);
            assert!(d.y.abs() <= 0.04 + 1e-3);
        }
    }

    #[test]
    fn test_emissive_only_near_formed() {
        let config = OrnamentFieldConfig::new("star", ShapeKind::Star, 10).with_emissive(2.0);
        let mut field = OrnamentField::build(&config, &tree(), 3);
        field.update(Mode::Formed, 0.1, 0.0);
        assert!(field.progress().raw() < EMISSIVE_THRESHOLD);
        assert!(field.transforms().iter().all(|t| t.emissive == 0.0));

        run(&mut field, Mode::Formed, 10.0);
        assert!(field.transforms().iter().any(|t| t.emissive > 0.0));
    }

    #[test]
    fn test_geometry_scale_applied_per_axis() {
        let config = OrnamentFieldConfig::new("cane", ShapeKind::Cylinder, 5)
            .with_scale_range(0.5, 0.5)
            .with_geometry_scale(Vec3::new(0.25, 2.5, 0.25));
        let field = OrnamentField::build(&config, &tree(), 9);
        for t in field.transforms() {
            assert!((t.scale - Vec3::new(0.125, 1.25, 0.125)).length() < 1e-5);
        }
    }

    #[test]
    fn test_weight_speeds_convergence() {
        let light = bells().with_weight(0.5);
        let heavy = bells().with_weight(2.0);
        let mut a = OrnamentField::build(&light, &tree(), 1);
        let mut b = OrnamentField::build(&heavy, &tree(), 1);
        run(&mut a, Mode::Formed, 1.0);
        run(&mut b, Mode::Formed, 1.0);
        assert!(b.progress().raw() > a.progress().raw());
    }
}
