//! WGSL generation for point fields.
//!
//! Each field gets its own shader with its [`FieldEffects`] baked in as
//! module constants. The vertex body mirrors [`super::evaluate_point`].

use super::{FieldEffects, PointLayout, PointVertex};
use crate::shader_utils::{EASING_WGSL, FRAME_WGSL, QUAD_WGSL};

/// Format an f32 so WGSL always reads it as a float literal.
fn lit(v: f32) -> String {
    format!("{:?}", v)
}

/// Full render shader (vertex + fragment) for one point field.
pub fn point_field_shader(fx: &FieldEffects) -> String {
    format!(
        r#"{frame}
struct FieldUniforms {{
    progress: f32,
    base_size: f32,
    _pad: vec2<f32>,
}};

@group(1) @binding(0)
var<uniform> field: FieldUniforms;

{input}
{easing}
{quad}
const TAU: f32 = 6.2831853;
const PULSE_AMOUNT: f32 = {pulse};
const PULSE_SPEED: f32 = {pulse_speed};
const TWINKLE_AMOUNT: f32 = {twinkle};
const TWINKLE_SPEED: f32 = {twinkle_speed};
const FLASH_RATE: f32 = {flash_rate};
const FLASH_THRESHOLD: f32 = {flash_threshold};
const FLASH_BOOST: f32 = {flash_boost};
const BOB_AMOUNT: f32 = {bob};
const BOB_SPEED: f32 = {bob_speed};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) alpha: f32,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    point: PointInput,
) -> VertexOutput {{
    let t = ease_out_cubic(field.progress);
    let phase = point.seed * TAU;

    var pos = mix(point.chaos_pos, point.target_pos, t);
    pos.y += sin(frame.time * BOB_SPEED + phase) * BOB_AMOUNT * field.progress;

    var size = field.base_size * point.size * (1.0 + PULSE_AMOUNT * sin(frame.time * PULSE_SPEED + phase));
    var alpha = 1.0 - TWINKLE_AMOUNT * (0.5 + 0.5 * sin(frame.time * TWINKLE_SPEED + phase * 3.0));

    let cycle = fract(frame.time * FLASH_RATE + point.seed * 7.31);
    let flash = select(0.0, 1.0, FLASH_RATE > 0.0 && cycle > FLASH_THRESHOLD);
    size = size * (1.0 + flash * FLASH_BOOST);
    alpha = max(alpha, flash);

    let corner = quad_corner(vertex_index);
    var clip_pos = frame.view_proj * vec4<f32>(pos, 1.0);
    clip_pos.x += corner.x * size * frame.proj_scale.x;
    clip_pos.y += corner.y * size * frame.proj_scale.y;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = point.color * (1.0 + flash);
    out.uv = corner;
    out.alpha = alpha;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv);
    if dist > 1.0 {{
        discard;
    }}
    let falloff = 1.0 - smoothstep(0.35, 1.0, dist);
    return vec4<f32>(in.color, in.alpha * falloff);
}}
"#,
        frame = FRAME_WGSL,
        input = PointVertex::WGSL_INPUT,
        easing = EASING_WGSL,
        quad = QUAD_WGSL,
        pulse = lit(fx.pulse),
        pulse_speed = lit(fx.pulse_speed),
        twinkle = lit(fx.twinkle),
        twinkle_speed = lit(fx.twinkle_speed),
        flash_rate = lit(fx.flash_rate),
        flash_threshold = lit(fx.flash_threshold),
        flash_boost = lit(fx.flash_boost),
        bob = lit(fx.bob),
        bob_speed = lit(fx.bob_speed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointFieldKind;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_every_kind_validates() {
        for kind in [
            PointFieldKind::Foliage,
            PointFieldKind::Glitter,
            PointFieldKind::Lights,
            PointFieldKind::Snow,
        ] {
            let shader = point_field_shader(&FieldEffects::for_kind(kind));
            validate_wgsl(&shader).unwrap_or_else(|e| panic!("{:?}: {}", kind, e));
        }
    }

    #[test]
    fn test_effects_baked_as_constants() {
        let shader = point_field_shader(&FieldEffects::for_kind(PointFieldKind::Lights));
        assert!(shader.contains("const FLASH_RATE: f32 = 0.35;"));
        let shader = point_field_shader(&FieldEffects::for_kind(PointFieldKind::Snow));
        assert!(shader.contains("const FLASH_RATE: f32 = 0.0;"));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(lit(1.0), "1.0");
        assert_eq!(lit(0.25), "0.25");
    }
}
