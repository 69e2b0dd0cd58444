//! Instanced mesh rendering.
//!
//! One vertex/index buffer pair per family and one instance buffer rewritten
//! every frame from the family's CPU-side transforms.

use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::mesh::{Mesh, MeshVertex};
use crate::ornament::{InstanceRaw, InstanceTransform};
use crate::scene::Scene;
use crate::shader_utils::{FRAME_WGSL, LIGHTING_WGSL};

/// Lit instanced shader. `textured` samples a photo at group 1.
pub fn mesh_shader(textured: bool) -> String {
    let (bindings, base_color) = if textured {
        (
            r#"
@group(1) @binding(0)
var photo: texture_2d<f32>;
@group(1) @binding(1)
var photo_sampler: sampler;
"#,
            "textureSample(photo, photo_sampler, in.uv).rgb",
        )
    } else {
        ("", "in.color")
    };

    format!(
        r#"{frame}
{lighting}
{bindings}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}};

struct InstanceInput {{
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec3<f32>,
    @location(8) emissive: f32,
}};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: f32,
    @location(4) uv: vec2<f32>,
}};

@vertex
fn vs_main(v: VertexInput, inst: InstanceInput) -> VertexOutput {{
    let model = mat4x4<f32>(inst.model_0, inst.model_1, inst.model_2, inst.model_3);
    let world = model * vec4<f32>(v.position, 1.0);

    // Inverse-transpose of rotation * scale without a matrix inverse.
    let scale_sq = vec3<f32>(
        dot(inst.model_0.xyz, inst.model_0.xyz),
        dot(inst.model_1.xyz, inst.model_1.xyz),
        dot(inst.model_2.xyz, inst.model_2.xyz),
    );
    let linear = mat3x3<f32>(inst.model_0.xyz, inst.model_1.xyz, inst.model_2.xyz);
    let normal = linear * (v.normal / max(scale_sq, vec3<f32>(1e-8)));

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normal;
    out.color = inst.color;
    out.emissive = inst.emissive;
    out.uv = v.uv;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {{
    let n = select(-in.normal, in.normal, front);
    let lit = shade({base_color}, n, in.world_pos, in.emissive);
    return vec4<f32>(lit, 1.0);
}}
"#,
        frame = FRAME_WGSL,
        lighting = LIGHTING_WGSL,
        bindings = bindings,
        base_color = base_color,
    )
}

/// Build a mesh pipeline. `extra` layouts follow the frame layout at group 1+.
pub fn create_mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader_src: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    surface_format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout(), InstanceRaw::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Static geometry of one mesh on the GPU.
pub struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    /// Bind geometry at slot 0 and the index buffer.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Growable per-instance buffer.
pub struct InstanceBuffer {
    label: String,
    buffer: wgpu::Buffer,
    capacity: usize,
    len: u32,
}

impl InstanceBuffer {
    pub fn new(device: &wgpu::Device, label: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            label: label.to_string(),
            buffer: Self::allocate(device, label, capacity),
            capacity,
            len: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[InstanceRaw]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buffer = Self::allocate(device, &self.label, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len() as u32;
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}

struct FamilyGpu {
    mesh: MeshBuffers,
    instances: InstanceBuffer,
}

/// Draws every instanced family of the scene.
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    families: Vec<FamilyGpu>,
    scratch: Vec<InstanceRaw>,
}

impl MeshRenderer {
    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
    ) -> Self {
        let pipeline = create_mesh_pipeline(
            device,
            "Ornament Pipeline",
            &mesh_shader(false),
            &[frame_layout],
            surface_format,
            Some(wgpu::Face::Back),
        );
        let mut renderer = Self {
            pipeline,
            families: Vec::new(),
            scratch: Vec::new(),
        };
        renderer.rebuild(device, scene);
        renderer
    }

    /// Recreate per-family buffers, e.g. after a theme switch.
    pub fn rebuild(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.families = scene
            .instanced()
            .map(|family| FamilyGpu {
                mesh: MeshBuffers::upload(device, &family.mesh(), family.label()),
                instances: InstanceBuffer::new(device, family.label(), family.len()),
            })
            .collect();
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for (gpu, family) in self.families.iter_mut().zip(scene.instanced()) {
            self.scratch.clear();
            self.scratch
                .extend(family.transforms().iter().map(InstanceTransform::to_raw));
            gpu.instances.write(device, queue, &self.scratch);
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for family in &self.families {
            if family.instances.len() == 0 {
                continue;
            }
            family.mesh.bind(pass);
            pass.set_vertex_buffer(1, family.instances.slice());
            pass.draw_indexed(0..family.mesh.index_count(), 0, 0..family.instances.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_solid_mesh_shader_validates() {
        validate_wgsl(&mesh_shader(false)).expect("Solid mesh WGSL should be valid");
    }

    #[test]
    fn test_textured_mesh_shader_validates() {
        let shader = mesh_shader(true);
        assert!(shader.contains("textureSample"));
        validate_wgsl(&shader).expect("Textured mesh WGSL should be valid");
    }

    #[test]
    fn test_instance_layout_matches_shader() {
        let layout = InstanceRaw::layout();
        assert_eq!(layout.array_stride, 80);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![3, 4, 5, 6, 7, 8]);
    }
}
