//! WGSL snippets shared by every generated shader.
//!
//! # Available Pieces
//!
//! - [`FRAME_WGSL`] - `FrameUniforms` struct bound at `@group(0) @binding(0)`
//! - [`EASING_WGSL`] - `ease_out_cubic(t: f32) -> f32`
//! - [`QUAD_WGSL`] - `quad_corner(vertex_index: u32) -> vec2<f32>` for billboards
//! - [`LIGHTING_WGSL`] - `shade(color, normal, world_pos, emissive) -> vec3<f32>`
//!
//! [`FrameUniforms`] is the Rust side of the frame uniform and must stay
//! byte-compatible with the WGSL struct.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame uniform shared by all pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub time: f32,
    /// Projection x/y scale, converts world-size billboards to clip offsets.
    pub proj_scale: [f32; 2],
    pub _pad: [f32; 2],
}

impl FrameUniforms {
    pub fn new(view: Mat4, proj: Mat4, camera_pos: Vec3, time: f32) -> Self {
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            time,
            proj_scale: [proj.x_axis.x, proj.y_axis.y],
            _pad: [0.0; 2],
        }
    }
}

/// Frame uniform declaration and binding.
pub const FRAME_WGSL: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec3<f32>,
    time: f32,
    proj_scale: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;
"#;

/// Easing curve applied to raw progress.
pub const EASING_WGSL: &str = r#"
fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - clamp(t, 0.0, 1.0);
    return 1.0 - inv * inv * inv;
}
"#;

/// Corners of a two-triangle billboard, indexed by `vertex_index`.
pub const QUAD_WGSL: &str = r#"
fn quad_corner(vertex_index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    return corners[vertex_index];
}
"#;

/// Key light plus ambient, with emissive added on top.
pub const LIGHTING_WGSL: &str = r#"
const KEY_LIGHT_DIR: vec3<f32> = vec3<f32>(0.4, 0.8, 0.45);
const AMBIENT: f32 = 0.28;

fn shade(color: vec3<f32>, normal: vec3<f32>, world_pos: vec3<f32>, emissive: f32) -> vec3<f32> {
    let n = normalize(normal);
    let l = normalize(KEY_LIGHT_DIR);
    let v = normalize(frame.camera_pos - world_pos);
    let h = normalize(l + v);
    let diffuse = max(dot(n, l), 0.0);
    let specular = pow(max(dot(n, h), 0.0), 32.0) * 0.35;
    return color * (AMBIENT + diffuse) + vec3<f32>(specular) + color * emissive;
}
"#;
