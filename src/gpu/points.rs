//! Point field rendering.
//!
//! Each field owns a pipeline built from its own generated shader, an
//! instance-stepped attribute buffer uploaded once, and a small uniform that
//! carries the field's progress every frame.

use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::field::{PointField, PointLayout, PointVertex};
use crate::scene::Scene;

struct FieldGpu {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    num_points: u32,
}

pub struct PointRenderer {
    field_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    fields: Vec<FieldGpu>,
}

impl PointRenderer {
    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
    ) -> Self {
        let field_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Field Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Field Pipeline Layout"),
            bind_group_layouts: &[frame_layout, &field_layout],
            push_constant_ranges: &[],
        });

        let mut renderer = Self {
            field_layout,
            pipeline_layout,
            surface_format,
            fields: Vec::new(),
        };
        renderer.rebuild(device, scene);
        renderer
    }

    /// Recreate every field's buffers, e.g. after a theme switch.
    pub fn rebuild(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.fields = scene
            .point_fields()
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| self.create_field(device, f))
            .collect();
    }

    fn create_field(&self, device: &wgpu::Device, field: &PointField) -> FieldGpu {
        let label = format!("{:?} Points", field.kind());
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(field.shader_source().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PointVertex::buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Test against meshes but do not occlude other points.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&label),
            contents: bytemuck::cast_slice(field.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Field Uniforms"),
            contents: bytemuck::bytes_of(&field.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Field Bind Group"),
            layout: &self.field_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        FieldGpu {
            pipeline,
            vertex_buffer,
            uniform_buffer,
            bind_group,
            num_points: field.len() as u32,
        }
    }

    /// Forward each field's progress to its uniform.
    pub fn upload(&self, queue: &wgpu::Queue, scene: &Scene) {
        let fields = scene.point_fields().iter().filter(|f| !f.is_empty());
        for (gpu, field) in self.fields.iter().zip(fields) {
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&field.uniforms()));
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for field in &self.fields {
            pass.set_pipeline(&field.pipeline);
            pass.set_bind_group(1, &field.bind_group, &[]);
            pass.set_vertex_buffer(0, field.vertex_buffer.slice(..));
            pass.draw(0..6, 0..field.num_points);
        }
    }
}
