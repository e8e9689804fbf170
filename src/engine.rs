//! Main engine orchestrator
//!
//! Owns the backend and the scene. Geometry is described the way it is
//! uploaded: a vertex buffer config with one backend buffer per slot, an
//! index buffer, a material, and a renderable tying them together.

use crate::backend::*;
use crate::pipeline::{pipeline_descriptor, vertex_layouts, BindGroupLayouts};
use crate::resources::*;
use crate::scene::*;
use crate::EngineConfig;
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use winit::window::Window as WinitWindow;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown vertex buffer {0:?}")]
    UnknownVertexBuffer(VertexBufferId),
    #[error("unknown index buffer {0:?}")]
    UnknownIndexBuffer(IndexBufferId),
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    #[error("unknown renderable {0:?}")]
    UnknownRenderable(RenderableId),
    #[error("unknown light {0:?}")]
    UnknownLight(LightId),
    #[error("buffer slot {slot} out of range, vertex buffer has {buffer_count}")]
    SlotOutOfRange { slot: u8, buffer_count: u8 },
    #[error("expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("geometry has no vertices or indices")]
    EmptyGeometry,
    #[error("{kind:?} material needs a {semantic:?} attribute")]
    MissingAttribute {
        kind: MaterialKind,
        semantic: VertexSemantic,
    },
    #[error("renderable {0:?} references buffers that were never filled")]
    IncompleteGeometry(RenderableId),
    #[error("invalid vertex layout: {0}")]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type EngineResult<T> = Result<T, EngineError>;

// wgpu::COPY_BUFFER_ALIGNMENT
const COPY_ALIGNMENT: u64 = 4;

fn aligned_size(size: u64) -> u64 {
    size.div_ceil(COPY_ALIGNMENT) * COPY_ALIGNMENT
}

struct GpuVertexBuffer {
    config: VertexBufferConfig,
    buffers: Vec<BufferHandle>,
    filled: Vec<bool>,
}

struct GpuIndexBuffer {
    config: IndexBufferConfig,
    buffer: BufferHandle,
    filled: bool,
}

struct GpuMaterial {
    material: Material,
    buffer: BufferHandle,
    bind_group: BindGroupHandle,
}

/// Per-renderable GPU resources
struct GpuObject {
    pipeline: RenderPipelineHandle,
    transform_buffer: BufferHandle,
    transform_bind_group: BindGroupHandle,
}

struct CachedPipeline {
    kind: MaterialKind,
    layouts: Vec<VertexBufferLayout>,
    primitive: PrimitiveType,
    handle: RenderPipelineHandle,
}

/// Resources shared by every draw
struct RenderState {
    layouts: BindGroupLayouts,
    camera_buffer: BufferHandle,
    lighting_buffer: BufferHandle,
    frame_bind_group: BindGroupHandle,
    depth_texture: TextureHandle,
    depth_view: TextureViewHandle,
}

/// The main graphics engine
pub struct Engine<B: GraphicsBackend> {
    backend: B,
    scene: Scene,
    state: RenderState,
    vertex_buffers: Vec<GpuVertexBuffer>,
    index_buffers: Vec<GpuIndexBuffer>,
    materials: Vec<GpuMaterial>,
    objects: HashMap<RenderableId, GpuObject>,
    pipelines: Vec<CachedPipeline>,
    width: u32,
    height: u32,
}

impl Engine<WgpuBackend> {
    /// Create an engine drawing into a window
    pub fn with_window(window: Arc<WinitWindow>, config: &EngineConfig) -> EngineResult<Self> {
        let backend = WgpuBackend::new(window, config.vsync)?;
        Self::new(backend, config)
    }
}

impl<B: GraphicsBackend> Engine<B> {
    pub fn new(mut backend: B, config: &EngineConfig) -> EngineResult<Self> {
        let (width, height) = backend.surface_size();
        let width = width.max(1);
        let height = height.max(1);

        let layouts = BindGroupLayouts::create(&mut backend)?;

        let camera_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Camera Buffer".into()),
            size: std::mem::size_of::<CameraUniformData>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;

        let lighting_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Lighting Buffer".into()),
            size: std::mem::size_of::<LightingUniformData>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;

        let frame_bind_group = backend.create_bind_group(
            layouts.frame,
            &[
                (
                    0,
                    BindGroupEntry::Buffer {
                        buffer: camera_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
                (
                    1,
                    BindGroupEntry::Buffer {
                        buffer: lighting_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
            ],
        )?;

        let depth_texture = backend.create_texture(&TextureDescriptor::depth(width, height))?;
        let depth_view = backend.create_texture_view(depth_texture)?;

        let mut scene = Scene::new();
        scene.clear_color = config.clear_color;
        scene.camera.exposure = config.exposure;
        scene.camera.set_aspect(width as f32, height as f32);

        log::info!(
            "Engine ready: {}x{}, swapchain {:?}",
            width,
            height,
            backend.swapchain_format()
        );

        Ok(Self {
            backend,
            scene,
            state: RenderState {
                layouts,
                camera_buffer,
                lighting_buffer,
                frame_bind_group,
                depth_texture,
                depth_view,
            },
            vertex_buffers: Vec::new(),
            index_buffers: Vec::new(),
            materials: Vec::new(),
            objects: HashMap::new(),
            pipelines: Vec::new(),
            width,
            height,
        })
    }

    /// Create a vertex buffer with one backend buffer per slot.
    /// Slots must be filled with [`Self::set_vertex_buffer_at`] before drawing.
    pub fn create_vertex_buffer(&mut self, config: VertexBufferConfig) -> EngineResult<VertexBufferId> {
        config.validate()?;
        if config.vertex_count == 0 {
            return Err(EngineError::EmptyGeometry);
        }

        let id = VertexBufferId(self.vertex_buffers.len());
        let mut buffers = Vec::with_capacity(usize::from(config.buffer_count));
        for slot in 0..config.buffer_count {
            let size = config.buffer_size(slot).unwrap_or(0);
            buffers.push(self.backend.create_buffer(&BufferDescriptor {
                label: Some(format!("Vertex Buffer {} slot {}", id.0, slot)),
                size: aligned_size(size),
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            })?);
        }

        log::debug!(
            "Created vertex buffer {:?}: {} vertices in {} slots",
            id,
            config.vertex_count,
            config.buffer_count
        );

        self.vertex_buffers.push(GpuVertexBuffer {
            filled: vec![false; buffers.len()],
            config,
            buffers,
        });
        Ok(id)
    }

    /// Upload the whole contents of one buffer slot
    pub fn set_vertex_buffer_at(
        &mut self,
        id: VertexBufferId,
        slot: u8,
        data: &[u8],
    ) -> EngineResult<()> {
        let vb = self
            .vertex_buffers
            .get_mut(id.0)
            .ok_or(EngineError::UnknownVertexBuffer(id))?;
        if slot >= vb.config.buffer_count {
            return Err(EngineError::SlotOutOfRange {
                slot,
                buffer_count: vb.config.buffer_count,
            });
        }
        let expected = vb.config.buffer_size(slot).unwrap_or(0);
        if data.len() as u64 != expected {
            return Err(EngineError::SizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }

        let buffer = vb.buffers[usize::from(slot)];
        vb.filled[usize::from(slot)] = true;
        write_aligned(&mut self.backend, buffer, data);
        Ok(())
    }

    pub fn create_index_buffer(&mut self, config: IndexBufferConfig) -> EngineResult<IndexBufferId> {
        if config.index_count == 0 {
            return Err(EngineError::EmptyGeometry);
        }
        let id = IndexBufferId(self.index_buffers.len());
        let buffer = self.backend.create_buffer(&BufferDescriptor {
            label: Some(format!("Index Buffer {}", id.0)),
            size: aligned_size(config.byte_size()),
            usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
        })?;
        self.index_buffers.push(GpuIndexBuffer {
            config,
            buffer,
            filled: false,
        });
        Ok(id)
    }

    pub fn set_index_buffer(&mut self, id: IndexBufferId, data: &[u8]) -> EngineResult<()> {
        let ib = self
            .index_buffers
            .get_mut(id.0)
            .ok_or(EngineError::UnknownIndexBuffer(id))?;
        let expected = ib.config.byte_size();
        if data.len() as u64 != expected {
            return Err(EngineError::SizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }
        ib.filled = true;
        let buffer = ib.buffer;
        write_aligned(&mut self.backend, buffer, data);
        Ok(())
    }

    pub fn create_material(&mut self, material: Material) -> EngineResult<MaterialId> {
        let id = MaterialId(self.materials.len());
        let buffer = self.backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("Material Buffer {}", material.name)),
                size: std::mem::size_of::<MaterialUniformData>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytemuck::bytes_of(&material.uniform_data()),
        )?;
        let bind_group = self.backend.create_bind_group(
            self.state.layouts.material,
            &[(
                0,
                BindGroupEntry::Buffer {
                    buffer,
                    offset: 0,
                    size: None,
                },
            )],
        )?;
        self.materials.push(GpuMaterial {
            material,
            buffer,
            bind_group,
        });
        Ok(id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0).map(|m| &m.material)
    }

    /// Change the base color (sRGB) of a material instance
    pub fn set_material_base_color(&mut self, id: MaterialId, srgb: Vec3) -> EngineResult<()> {
        let gpu = self
            .materials
            .get_mut(id.0)
            .ok_or(EngineError::UnknownMaterial(id))?;
        gpu.material.base_color = srgb;
        let uniform = gpu.material.uniform_data();
        let buffer = gpu.buffer;
        self.backend
            .write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
        Ok(())
    }

    /// Add a renderable to the scene.
    ///
    /// The vertex buffer must carry every attribute the material reads. The
    /// pipeline is built (or reused) here so shader errors surface early.
    pub fn create_renderable(&mut self, config: RenderableConfig) -> EngineResult<RenderableId> {
        let vb = self
            .vertex_buffers
            .get(config.vertex_buffer.0)
            .ok_or(EngineError::UnknownVertexBuffer(config.vertex_buffer))?;
        if self.index_buffers.get(config.index_buffer.0).is_none() {
            return Err(EngineError::UnknownIndexBuffer(config.index_buffer));
        }
        let kind = self
            .materials
            .get(config.material.0)
            .ok_or(EngineError::UnknownMaterial(config.material))?
            .material
            .kind;
        if let Some(&semantic) = kind
            .required_semantics()
            .iter()
            .find(|s| !vb.config.has_semantic(**s))
        {
            return Err(EngineError::MissingAttribute { kind, semantic });
        }

        let vertex_config = vb.config.clone();
        let pipeline = self.pipeline_for(kind, &vertex_config, config.primitive)?;

        let transform_buffer = self.backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("Transform Buffer".into()),
                size: std::mem::size_of::<TransformUniformData>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytemuck::bytes_of(&Transform::default().uniform_data()),
        )?;
        let transform_bind_group = self.backend.create_bind_group(
            self.state.layouts.object,
            &[(
                0,
                BindGroupEntry::Buffer {
                    buffer: transform_buffer,
                    offset: 0,
                    size: None,
                },
            )],
        )?;

        let id = self.scene.add_renderable(config);
        self.objects.insert(
            id,
            GpuObject {
                pipeline,
                transform_buffer,
                transform_bind_group,
            },
        );
        Ok(id)
    }

    pub fn remove_renderable(&mut self, id: RenderableId) -> EngineResult<()> {
        if !self.scene.remove_renderable(id) {
            return Err(EngineError::UnknownRenderable(id));
        }
        if let Some(object) = self.objects.remove(&id) {
            self.backend.destroy_buffer(object.transform_buffer);
        }
        Ok(())
    }

    /// Ok when every buffer a renderable draws from has been filled
    pub fn check_renderable(&self, id: RenderableId) -> EngineResult<()> {
        let renderable = self
            .scene
            .renderable(id)
            .ok_or(EngineError::UnknownRenderable(id))?;
        if self.is_complete(&renderable.config) {
            Ok(())
        } else {
            Err(EngineError::IncompleteGeometry(id))
        }
    }

    fn is_complete(&self, config: &RenderableConfig) -> bool {
        let vertices = self
            .vertex_buffers
            .get(config.vertex_buffer.0)
            .is_some_and(|vb| vb.filled.iter().all(|f| *f));
        let indices = self
            .index_buffers
            .get(config.index_buffer.0)
            .is_some_and(|ib| ib.filled);
        vertices && indices
    }

    pub fn set_transform(&mut self, id: RenderableId, matrix: Mat4) -> EngineResult<()> {
        if self.scene.set_transform(id, Transform::from_matrix(matrix)) {
            Ok(())
        } else {
            Err(EngineError::UnknownRenderable(id))
        }
    }

    pub fn set_visible(&mut self, id: RenderableId, visible: bool) -> EngineResult<()> {
        if self.scene.set_visible(id, visible) {
            Ok(())
        } else {
            Err(EngineError::UnknownRenderable(id))
        }
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) -> LightId {
        self.scene.add_directional_light(light)
    }

    pub fn remove_light(&mut self, id: LightId) -> EngineResult<()> {
        if self.scene.remove_light(id) {
            Ok(())
        } else {
            Err(EngineError::UnknownLight(id))
        }
    }

    /// Upload a mesh and add it to the scene.
    ///
    /// Positions go to slot 0, tangent frames to slot 1 and, when the mesh
    /// has them, colors to slot 2.
    pub fn upload_mesh(&mut self, mesh: &Mesh, material: MaterialId) -> EngineResult<RenderableId> {
        let vertex_count = mesh.vertex_count() as u32;
        let config = if mesh.has_colors() {
            VertexBufferConfig::position_tangents_and_colors(vertex_count)
        } else {
            VertexBufferConfig::position_and_tangents(vertex_count)
        };

        let vb = self.create_vertex_buffer(config)?;
        self.set_vertex_buffer_at(vb, 0, mesh.position_bytes())?;
        self.set_vertex_buffer_at(vb, 1, mesh.tangent_bytes())?;
        if mesh.has_colors() {
            self.set_vertex_buffer_at(vb, 2, mesh.color_bytes())?;
        }

        let ib = self.create_index_buffer(IndexBufferConfig::new(
            mesh.index_count() as u32,
            IndexType::UShort,
        ))?;
        self.set_index_buffer(ib, mesh.index_bytes())?;

        let id = self.create_renderable(
            RenderableConfig::new(vb, ib, material).with_bounding_box(mesh.bounding_box()),
        )?;

        log::info!(
            "Uploaded mesh '{}': {} vertices, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(id)
    }

    fn pipeline_for(
        &mut self,
        kind: MaterialKind,
        config: &VertexBufferConfig,
        primitive: PrimitiveType,
    ) -> EngineResult<RenderPipelineHandle> {
        let layouts = vertex_layouts(config, kind);
        if let Some(cached) = self
            .pipelines
            .iter()
            .find(|p| p.kind == kind && p.primitive == primitive && p.layouts == layouts)
        {
            return Ok(cached.handle);
        }

        let desc = pipeline_descriptor(
            kind,
            config,
            primitive,
            &self.state.layouts,
            self.backend.swapchain_format(),
        );
        let handle = self.backend.create_render_pipeline(&desc)?;
        log::debug!("Created {:?} pipeline for {:?}", kind, primitive);

        self.pipelines.push(CachedPipeline {
            kind,
            layouts,
            primitive,
            handle,
        });
        Ok(handle)
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.backend.resize(width, height);

        // The backend may clamp to device limits
        let (actual_width, actual_height) = self.backend.surface_size();
        if actual_width == self.width && actual_height == self.height {
            return Ok(());
        }
        self.width = actual_width;
        self.height = actual_height;
        self.scene
            .camera
            .set_aspect(actual_width as f32, actual_height as f32);

        self.backend.destroy_texture(self.state.depth_texture);
        let depth_texture = self
            .backend
            .create_texture(&TextureDescriptor::depth(actual_width, actual_height))?;
        self.state.depth_view = self.backend.create_texture_view(depth_texture)?;
        self.state.depth_texture = depth_texture;

        log::debug!("Resized to {}x{}", actual_width, actual_height);
        Ok(())
    }

    /// Render and present one frame
    pub fn render(&mut self) -> EngineResult<()> {
        let frame = match self.backend.begin_frame() {
            Ok(frame) => frame,
            Err(BackendError::SurfaceLost) => {
                log::warn!("Surface lost, reconfiguring");
                self.backend.resize(self.width, self.height);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let camera = self.scene.camera.uniform_data();
        self.backend
            .write_buffer(self.state.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let lights = self.scene.directional_lights();
        let lighting = LightingUniformData::new(&lights, self.scene.camera.exposure.multiplier());
        self.backend
            .write_buffer(self.state.lighting_buffer, 0, bytemuck::bytes_of(&lighting));

        let renderables = self.scene.renderables();
        for (id, _, transform) in &renderables {
            if let Some(object) = self.objects.get(id) {
                self.backend.write_buffer(
                    object.transform_buffer,
                    0,
                    bytemuck::bytes_of(&transform.uniform_data()),
                );
            }
        }

        self.backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Main Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(self.scene.clear_color),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                view: self.state.depth_view,
                depth_load_op: LoadOp::Clear([1.0, 0.0, 0.0, 0.0]),
                depth_store_op: StoreOp::Store,
                depth_clear_value: 1.0,
            }),
        });

        self.backend
            .set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32, 0.0, 1.0);
        self.backend.set_bind_group(0, self.state.frame_bind_group);

        let view_proj = camera.view_proj;
        for (id, renderable, transform) in &renderables {
            if !renderable.visible {
                continue;
            }
            let config = &renderable.config;
            if config.culling
                && config
                    .bounding_box
                    .is_outside_clip(view_proj * transform.matrix())
            {
                continue;
            }
            if !self.is_complete(config) {
                log::warn!("Skipping {:?}: geometry not uploaded", id);
                continue;
            }
            let (Some(object), Some(vb), Some(ib), Some(material)) = (
                self.objects.get(id),
                self.vertex_buffers.get(config.vertex_buffer.0),
                self.index_buffers.get(config.index_buffer.0),
                self.materials.get(config.material.0),
            ) else {
                continue;
            };

            self.backend.set_render_pipeline(object.pipeline);
            self.backend.set_bind_group(1, object.transform_bind_group);
            self.backend.set_bind_group(2, material.bind_group);
            for (slot, buffer) in vb.buffers.iter().enumerate() {
                self.backend.set_vertex_buffer(slot as u32, *buffer, 0);
            }
            self.backend
                .set_index_buffer(ib.buffer, 0, ib.config.index_type.index_format());
            self.backend.draw_indexed(0..ib.config.index_count, 0, 0..1);
        }

        self.backend.end_render_pass();
        self.backend.end_frame()?;
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.scene.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.scene.camera
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.scene.clear_color = color;
    }

    /// Get current dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

/// Write `data` padded up to the copy alignment
fn write_aligned<B: GraphicsBackend>(backend: &mut B, buffer: BufferHandle, data: &[u8]) {
    if data.len() as u64 % COPY_ALIGNMENT == 0 {
        backend.write_buffer(buffer, 0, data);
    } else {
        let mut padded = data.to_vec();
        padded.resize(aligned_size(data.len() as u64) as usize, 0);
        backend.write_buffer(buffer, 0, &padded);
    }
}
