//! Procedural triangle meshes for instanced ornaments and feature objects.
//!
//! Every primitive is centered on the origin and fits roughly inside a unit
//! cube, so an instance's scale reads as its size in world units. Triangles
//! wind counter-clockwise seen from outside.

use crate::config::ShapeKind;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// One mesh vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Primitive for an ornament shape.
    pub fn for_shape(shape: ShapeKind) -> Self {
        match shape {
            ShapeKind::Box => Self::cuboid(Vec3::splat(0.5)),
            ShapeKind::Sphere => Self::uv_sphere(0.5, 24, 16),
            ShapeKind::Cylinder => Self::cylinder(0.5, 1.0, 20),
            ShapeKind::Cone => Self::cone(0.5, 1.0, 20),
            ShapeKind::Dodecahedron => Self::dodecahedron(0.5),
            ShapeKind::Star => Self::octahedron(0.6),
            ShapeKind::FlatBox => Self::cuboid(Vec3::new(0.5, 0.5, 0.15)),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Shift every vertex by `offset`.
    pub fn translated(mut self, offset: Vec3) -> Self {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).to_array();
        }
        self
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        });
        index
    }

    /// Flat-shaded triangle.
    fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let i = self.push_vertex(a, normal, Vec2::ZERO);
        self.push_vertex(b, normal, Vec2::new(1.0, 0.0));
        self.push_vertex(c, normal, Vec2::new(0.0, 1.0));
        self.indices.extend_from_slice(&[i, i + 1, i + 2]);
    }

    /// Flat quad; corners counter-clockwise around `normal`.
    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];
        let i = self.vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.push_vertex(corner, normal, uv);
        }
        self.indices
            .extend_from_slice(&[i, i + 1, i + 2, i, i + 2, i + 3]);
    }

    /// Axis-aligned box with the given half extents.
    pub fn cuboid(half: Vec3) -> Self {
        // (normal, u, v) with u x v = normal
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut mesh = Self::default();
        for (n, u, v) in faces {
            let corner = |su: f32, sv: f32| (n + u * su + v * sv) * half;
            mesh.push_quad(
                [
                    corner(-1.0, -1.0),
                    corner(1.0, -1.0),
                    corner(1.0, 1.0),
                    corner(-1.0, 1.0),
                ],
                n,
            );
        }
        mesh
    }

    /// Smooth UV sphere.
    pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> Self {
        let sectors = sectors.max(3);
        let stacks = stacks.max(2);
        let mut mesh = Self::default();

        for i in 0..=stacks {
            let phi = PI * i as f32 / stacks as f32;
            for j in 0..=sectors {
                let theta = TAU * j as f32 / sectors as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                let uv = Vec2::new(j as f32 / sectors as f32, i as f32 / stacks as f32);
                mesh.push_vertex(n * radius, n, uv);
            }
        }

        let row = sectors + 1;
        for i in 0..stacks {
            for j in 0..sectors {
                let k1 = i * row + j;
                let k2 = k1 + row;
                if i != 0 {
                    mesh.indices.extend_from_slice(&[k1, k1 + 1, k2]);
                }
                if i != stacks - 1 {
                    mesh.indices.extend_from_slice(&[k1 + 1, k2 + 1, k2]);
                }
            }
        }
        mesh
    }

    /// Capped cylinder along Y, centered on the origin.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let mut mesh = Self::default();

        for j in 0..=segments {
            let theta = TAU * j as f32 / segments as f32;
            let n = Vec3::new(theta.cos(), 0.0, theta.sin());
            let u = j as f32 / segments as f32;
            mesh.push_vertex(n * radius - Vec3::Y * half, n, Vec2::new(u, 1.0));
            mesh.push_vertex(n * radius + Vec3::Y * half, n, Vec2::new(u, 0.0));
        }
        for j in 0..segments {
            let b0 = 2 * j;
            let (t0, b1, t1) = (b0 + 1, b0 + 2, b0 + 3);
            mesh.indices.extend_from_slice(&[b0, t0, b1, t0, t1, b1]);
        }

        mesh.push_cap(radius, half, segments, true);
        mesh.push_cap(radius, -half, segments, false);
        mesh
    }

    /// Cone along Y with its base at `-height / 2` and apex at `+height / 2`.
    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let apex = Vec3::Y * half;
        let mut mesh = Self::default();

        let slant = |theta: f32| {
            Vec3::new(height * theta.cos(), radius, height * theta.sin()).normalize()
        };
        for j in 0..segments {
            let t0 = TAU * j as f32 / segments as f32;
            let t1 = TAU * (j + 1) as f32 / segments as f32;
            let p0 = Vec3::new(radius * t0.cos(), -half, radius * t0.sin());
            let p1 = Vec3::new(radius * t1.cos(), -half, radius * t1.sin());

            let a = mesh.push_vertex(p0, slant(t0), Vec2::new(0.0, 1.0));
            let b = mesh.push_vertex(apex, slant((t0 + t1) * 0.5), Vec2::new(0.5, 0.0));
            let c = mesh.push_vertex(p1, slant(t1), Vec2::new(1.0, 1.0));
            mesh.indices.extend_from_slice(&[a, b, c]);
        }

        mesh.push_cap(radius, -half, segments, false);
        mesh
    }

    fn push_cap(&mut self, radius: f32, y: f32, segments: u32, up: bool) {
        let normal = if up { Vec3::Y } else { Vec3::NEG_Y };
        let center = self.push_vertex(Vec3::Y * y, normal, Vec2::splat(0.5));
        for j in 0..=segments {
            let theta = TAU * j as f32 / segments as f32;
            let (s, c) = theta.sin_cos();
            self.push_vertex(
                Vec3::new(radius * c, y, radius * s),
                normal,
                Vec2::new(0.5 + 0.5 * c, 0.5 + 0.5 * s),
            );
        }
        for j in 0..segments {
            let p0 = center + 1 + j;
            let p1 = p0 + 1;
            if up {
                self.indices.extend_from_slice(&[center, p1, p0]);
            } else {
                self.indices.extend_from_slice(&[center, p0, p1]);
            }
        }
    }

    /// Regular octahedron; the "star" ornament shape.
    pub fn octahedron(radius: f32) -> Self {
        let mut mesh = Self::default();
        for sx in [1.0f32, -1.0] {
            for sy in [1.0f32, -1.0] {
                for sz in [1.0f32, -1.0] {
                    let a = Vec3::X * sx * radius;
                    let b = Vec3::Y * sy * radius;
                    let c = Vec3::Z * sz * radius;
                    if sx * sy * sz > 0.0 {
                        mesh.push_triangle(a, b, c);
                    } else {
                        mesh.push_triangle(a, c, b);
                    }
                }
            }
        }
        mesh
    }

    /// Regular dodecahedron with vertices at `radius`.
    ///
    /// Built as the dual of an icosahedron: each icosahedron face center is
    /// a dodecahedron vertex, and the five faces around each icosahedron
    /// vertex form one pentagon.
    pub fn dodecahedron(radius: f32) -> Self {
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let mut ico = Vec::with_capacity(12);
        for a in [-1.0f32, 1.0] {
            for b in [-phi, phi] {
                ico.push(Vec3::new(0.0, a, b));
                ico.push(Vec3::new(a, b, 0.0));
                ico.push(Vec3::new(b, 0.0, a));
            }
        }

        // Faces are vertex triples at mutual edge distance 2.
        let is_edge = |p: Vec3, q: Vec3| (p.distance_squared(q) - 4.0).abs() < 1e-3;
        let mut centers = Vec::with_capacity(20);
        let mut faces_of = vec![Vec::with_capacity(5); ico.len()];
        for i in 0..ico.len() {
            for j in i + 1..ico.len() {
                if !is_edge(ico[i], ico[j]) {
                    continue;
                }
                for k in j + 1..ico.len() {
                    if is_edge(ico[i], ico[k]) && is_edge(ico[j], ico[k]) {
                        let face = centers.len();
                        centers.push(((ico[i] + ico[j] + ico[k]) / 3.0).normalize() * radius);
                        faces_of[i].push(face);
                        faces_of[j].push(face);
                        faces_of[k].push(face);
                    }
                }
            }
        }

        let mut mesh = Self::default();
        for (vertex, faces) in ico.iter().zip(&faces_of) {
            let n = vertex.normalize();
            let u = n.any_orthonormal_vector();
            let w = n.cross(u);

            let mut ring: Vec<Vec3> = faces.iter().map(|&f| centers[f]).collect();
            ring.sort_by(|a, b| {
                let angle = |p: &Vec3| p.dot(w).atan2(p.dot(u));
                angle(a).total_cmp(&angle(b))
            });

            for k in 1..ring.len().saturating_sub(1) {
                mesh.push_triangle(ring[0], ring[k], ring[k + 1]);
            }
        }
        mesh
    }

    /// Flat quad in the XY plane facing +Z.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let mut mesh = Self::default();
        mesh.push_quad(
            [
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            Vec3::Z,
        );
        mesh
    }

    /// Flat annulus in the XY plane facing +Z.
    pub fn ring(inner: f32, outer: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut mesh = Self::default();
        for j in 0..=segments {
            let theta = TAU * j as f32 / segments as f32;
            let dir = Vec3::new(theta.cos(), theta.sin(), 0.0);
            let u = j as f32 / segments as f32;
            mesh.push_vertex(dir * inner, Vec3::Z, Vec2::new(u, 0.0));
            mesh.push_vertex(dir * outer, Vec3::Z, Vec2::new(u, 1.0));
        }
        for j in 0..segments {
            let i0 = 2 * j;
            let (o0, i1, o1) = (i0 + 1, i0 + 2, i0 + 3);
            mesh.indices.extend_from_slice(&[i0, o0, o1, i0, o1, i1]);
        }
        mesh
    }

    /// Extruded star polygon in the XY plane, `depth` thick along Z.
    pub fn star_prism(points: u32, outer: f32, inner: f32, depth: f32) -> Self {
        let points = points.max(3);
        let half = depth * 0.5;
        let outline: Vec<Vec3> = (0..points * 2)
            .map(|k| {
                let angle = PI / 2.0 + PI * k as f32 / points as f32;
                let r = if k % 2 == 0 { outer } else { inner };
                Vec3::new(r * angle.cos(), r * angle.sin(), 0.0)
            })
            .collect();

        let mut mesh = Self::default();
        let front = Vec3::Z * half;
        for k in 0..outline.len() {
            let p0 = outline[k];
            let p1 = outline[(k + 1) % outline.len()];
            mesh.push_triangle(front, p0 + front, p1 + front);
            mesh.push_triangle(-front, p1 - front, p0 - front);

            let edge = p1 - p0;
            let n = Vec3::new(edge.y, -edge.x, 0.0).normalize_or_zero();
            mesh.push_quad([p0 + front, p0 - front, p1 - front, p1 + front], n);
        }
        mesh
    }
}
