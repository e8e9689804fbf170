//! Render pipeline construction
//!
//! Maps a material kind and a vertex buffer layout to a pipeline descriptor.
//! Every pipeline shares the same three bind group layouts (see [`shaders`]).

pub mod shaders;

pub use shaders::{LIT_SHADER, VERTEX_COLOR_SHADER};

use crate::backend::*;
use crate::resources::{MaterialKind, PrimitiveType, VertexBufferConfig};

/// Depth buffer format used by every pipeline
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// WGSL source for a material kind
pub fn shader_source(kind: MaterialKind) -> &'static str {
    match kind {
        MaterialKind::Lit => LIT_SHADER,
        MaterialKind::VertexColor => VERTEX_COLOR_SHADER,
    }
}

/// Bind group layouts shared by all pipelines
#[derive(Debug, Clone, Copy)]
pub struct BindGroupLayouts {
    /// Camera and lights
    pub frame: BindGroupLayoutHandle,
    pub object: BindGroupLayoutHandle,
    pub material: BindGroupLayoutHandle,
}

impl BindGroupLayouts {
    pub fn create<B: GraphicsBackend + ?Sized>(backend: &mut B) -> BackendResult<Self> {
        let frame = backend.create_bind_group_layout(&[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::VERTEX_FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
        ])?;

        let object = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::VERTEX,
            ty: BindingType::UniformBuffer,
        }])?;

        let material = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::UniformBuffer,
        }])?;

        Ok(Self {
            frame,
            object,
            material,
        })
    }
}

/// One backend layout per buffer slot, keeping only the attributes the
/// material's shader reads. Slots stay aligned with `buffer_index`.
pub fn vertex_layouts(config: &VertexBufferConfig, kind: MaterialKind) -> Vec<VertexBufferLayout> {
    let used = kind.required_semantics();
    (0..config.buffer_count)
        .map(|slot| VertexBufferLayout {
            array_stride: u64::from(config.stride(slot).unwrap_or(0)),
            step_mode: VertexStepMode::Vertex,
            attributes: config
                .attributes_in(slot)
                .filter(|a| used.contains(&a.semantic))
                .map(|a| VertexAttribute {
                    location: a.semantic.shader_location(),
                    format: a.ty.vertex_format(a.normalized),
                    offset: u64::from(a.offset),
                })
                .collect(),
        })
        .collect()
}

/// Pipeline descriptor for drawing `config` geometry with a `kind` material
pub fn pipeline_descriptor(
    kind: MaterialKind,
    config: &VertexBufferConfig,
    primitive: PrimitiveType,
    layouts: &BindGroupLayouts,
    color_format: TextureFormat,
) -> RenderPipelineDescriptor {
    RenderPipelineDescriptor {
        label: Some(format!("{:?} Pipeline", kind)),
        shader: shader_source(kind).to_string(),
        vertex_layouts: vertex_layouts(config, kind),
        bind_group_layouts: vec![layouts.frame, layouts.object, layouts.material],
        primitive_topology: primitive.topology(),
        front_face: FrontFace::Ccw,
        cull_mode: CullMode::Back,
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
        }),
        color_targets: vec![ColorTargetState {
            format: color_format,
        }],
    }
}
