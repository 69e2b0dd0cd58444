//! Photo card rendering.
//!
//! Every card is drawn as three parts sharing the card's model matrix: the
//! backing and ring through the two-sided solid pipeline, the inset through a
//! textured pipeline with one bind group per loaded photo.
//!
//! Images are decoded on a [`PhotoLoader`] worker thread. A card is not drawn
//! until its texture is ready, and never if its image failed to load.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use image::RgbaImage;

use super::meshes::{create_mesh_pipeline, mesh_shader, InstanceBuffer, MeshBuffers};
use crate::error::PhotoError;
use crate::feature::{CardPart, PhotoRef};
use crate::ornament::InstanceRaw;
use crate::scene::Scene;

/// Longest edge of an uploaded photo texture.
pub const MAX_PHOTO_EDGE: u32 = 1024;

const RING_COLOR: [f32; 3] = [0.83, 0.69, 0.22];

/// Decode a photo, crop it to a centered square and bound its size.
pub fn load_photo(path: &Path) -> Result<RgbaImage, PhotoError> {
    let img = image::open(path).map_err(|source| PhotoError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(PhotoError::Empty(path.to_path_buf()));
    }
    let side = width.min(height);
    let square = img.crop_imm((width - side) / 2, (height - side) / 2, side, side);
    let square = if side > MAX_PHOTO_EDGE {
        square.thumbnail(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE)
    } else {
        square
    };
    Ok(square.into_rgba8())
}

/// A finished decode: the photo and its image or the reason it failed.
pub type DecodedPhoto = (PhotoRef, Result<RgbaImage, PhotoError>);

/// Decodes photos on a background thread.
///
/// The render loop queues references with [`PhotoLoader::request`] and picks
/// up finished images with [`PhotoLoader::poll`]; neither call blocks. The
/// worker exits when the loader is dropped.
pub struct PhotoLoader {
    requests: mpsc::Sender<PhotoRef>,
    results: mpsc::Receiver<DecodedPhoto>,
    pending: HashSet<PhotoRef>,
}

impl PhotoLoader {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel::<PhotoRef>();
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            for reference in request_rx {
                let decoded = load_photo(Path::new(reference.as_str()));
                if result_tx.send((reference, decoded)).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            results: result_rx,
            pending: HashSet::new(),
        }
    }

    /// Queue a decode. Returns false if one is already in flight.
    pub fn request(&mut self, reference: &PhotoRef) -> bool {
        if self.pending.contains(reference) {
            return false;
        }
        if self.requests.send(reference.clone()).is_err() {
            tracing::warn!(photo = %reference, "photo loader thread is gone");
            return false;
        }
        self.pending.insert(reference.clone());
        true
    }

    /// Decodes finished since the last poll.
    pub fn poll(&mut self) -> Vec<DecodedPhoto> {
        let mut done = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(decoded) => {
                    self.pending.remove(&decoded.0);
                    done.push(decoded);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if !self.pending.is_empty() {
                        tracing::warn!(pending = self.pending.len(), "photo loader stopped");
                        self.pending.clear();
                    }
                    break;
                }
            }
        }
        done
    }
}

pub struct PhotoRenderer {
    frame_pipeline: wgpu::RenderPipeline,
    inset_pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    backing: MeshBuffers,
    inset: MeshBuffers,
    ring: MeshBuffers,
    backing_instances: InstanceBuffer,
    inset_instances: InstanceBuffer,
    ring_instances: InstanceBuffer,
    loader: PhotoLoader,
    textures: HashMap<PhotoRef, wgpu::BindGroup>,
    failed: HashSet<PhotoRef>,
    /// References drawn this frame, in inset instance order.
    visible: Vec<PhotoRef>,
}

impl PhotoRenderer {
    pub fn new(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Photo Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_pipeline = create_mesh_pipeline(
            device,
            "Photo Frame Pipeline",
            &mesh_shader(false),
            &[frame_layout],
            surface_format,
            None,
        );
        let inset_pipeline = create_mesh_pipeline(
            device,
            "Photo Inset Pipeline",
            &mesh_shader(true),
            &[frame_layout, &texture_layout],
            surface_format,
            None,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Photo Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let [backing, inset, ring] =
            CardPart::ALL.map(|part| MeshBuffers::upload(device, &part.mesh(), part.label()));

        Self {
            frame_pipeline,
            inset_pipeline,
            texture_layout,
            sampler,
            backing,
            inset,
            ring,
            backing_instances: InstanceBuffer::new(device, "Photo Backing Instances", 8),
            inset_instances: InstanceBuffer::new(device, "Photo Inset Instances", 8),
            ring_instances: InstanceBuffer::new(device, "Photo Ring Instances", 8),
            loader: PhotoLoader::spawn(),
            textures: HashMap::new(),
            failed: HashSet::new(),
            visible: Vec::new(),
        }
    }

    /// Upload finished decodes, queue new cards and drop removed ones.
    fn sync_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        let gallery = scene.gallery();
        self.textures.retain(|reference, _| gallery.card(reference).is_some());
        self.failed.retain(|reference| gallery.card(reference).is_some());

        for (reference, decoded) in self.loader.poll() {
            if gallery.card(&reference).is_none() {
                continue;
            }
            match decoded {
                Ok(image) => {
                    let bind_group = self.upload_texture(device, queue, &reference, &image);
                    tracing::debug!(photo = %reference, width = image.width(), "photo loaded");
                    self.textures.insert(reference, bind_group);
                }
                Err(e) => {
                    tracing::warn!(photo = %reference, error = %e, "skipping photo card");
                    self.failed.insert(reference);
                }
            }
        }

        for card in gallery.cards() {
            let reference = card.reference();
            if !self.textures.contains_key(reference) && !self.failed.contains(reference) {
                self.loader.request(reference);
            }
        }
    }

    fn upload_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        reference: &PhotoRef,
        image: &RgbaImage,
    ) -> wgpu::BindGroup {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(reference.as_str()),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Photo Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        self.sync_textures(device, queue, scene);

        let gallery = scene.gallery();
        let time = scene.elapsed();
        let frame_color = scene.config().photos.frame_color.linear().to_array();

        self.visible.clear();
        let mut backing = Vec::with_capacity(gallery.len());
        let mut inset = Vec::with_capacity(gallery.len());
        let mut ring = Vec::with_capacity(gallery.len());
        for card in gallery.cards() {
            if !self.textures.contains_key(card.reference()) {
                continue;
            }
            let model = card.model_matrix(gallery.card_size(), time).to_cols_array_2d();
            backing.push(InstanceRaw {
                model,
                color: frame_color,
                emissive: 0.0,
            });
            inset.push(InstanceRaw {
                model,
                color: [1.0; 3],
                emissive: 0.0,
            });
            ring.push(InstanceRaw {
                model,
                color: RING_COLOR,
                emissive: 0.0,
            });
            self.visible.push(card.reference().clone());
        }

        self.backing_instances.write(device, queue, &backing);
        self.inset_instances.write(device, queue, &inset);
        self.ring_instances.write(device, queue, &ring);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let count = self.visible.len() as u32;
        if count == 0 {
            return;
        }

        pass.set_pipeline(&self.frame_pipeline);
        for (mesh, instances) in [
            (&self.backing, &self.backing_instances),
            (&self.ring, &self.ring_instances),
        ] {
            mesh.bind(pass);
            pass.set_vertex_buffer(1, instances.slice());
            pass.draw_indexed(0..mesh.index_count(), 0, 0..count);
        }

        pass.set_pipeline(&self.inset_pipeline);
        self.inset.bind(pass);
        pass.set_vertex_buffer(1, self.inset_instances.slice());
        for (i, reference) in self.visible.iter().enumerate() {
            if let Some(bind_group) = self.textures.get(reference) {
                let i = i as u32;
                pass.set_bind_group(1, bind_group, &[]);
                pass.draw_indexed(0..self.inset.index_count(), 0, i..i + 1);
            }
        }
    }
}
