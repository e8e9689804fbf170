//! Vertex/index buffer layouts and renderable descriptions

use crate::backend::{IndexFormat, PrimitiveTopology, VertexFormat};
use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

/// Handle to a vertex buffer created by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub(crate) usize);

/// Handle to an index buffer created by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(pub(crate) usize);

/// Handle to a material instance created by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// What a vertex attribute feeds in the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    /// Packed tangent frame quaternion
    Tangents,
    Color,
}

impl VertexSemantic {
    /// Shader location the pipelines bind this semantic to
    pub fn shader_location(self) -> u32 {
        match self {
            VertexSemantic::Position => 0,
            VertexSemantic::Tangents => 1,
            VertexSemantic::Color => 2,
        }
    }
}

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float3,
    Float4,
    Short4,
}

impl AttributeType {
    /// Size in bytes of one element
    pub fn size(self) -> u32 {
        match self {
            AttributeType::Float3 => 12,
            AttributeType::Float4 => 16,
            AttributeType::Short4 => 8,
        }
    }

    /// Backend vertex format; integer attributes are read as snorm when normalized
    pub fn vertex_format(self, normalized: bool) -> VertexFormat {
        match (self, normalized) {
            (AttributeType::Float3, _) => VertexFormat::Float32x3,
            (AttributeType::Float4, _) => VertexFormat::Float32x4,
            (AttributeType::Short4, true) => VertexFormat::Snorm16x4,
            (AttributeType::Short4, false) => VertexFormat::Sint16x4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeConfig {
    pub semantic: VertexSemantic,
    /// Which buffer slot holds this attribute
    pub buffer_index: u8,
    pub ty: AttributeType,
    pub offset: u32,
    /// Byte stride, 0 means tightly packed
    pub stride: u32,
    pub normalized: bool,
}

impl VertexAttributeConfig {
    pub fn new(semantic: VertexSemantic, buffer_index: u8, ty: AttributeType) -> Self {
        Self {
            semantic,
            buffer_index,
            ty,
            offset: 0,
            stride: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn effective_stride(&self) -> u32 {
        if self.stride == 0 {
            self.ty.size()
        } else {
            self.stride
        }
    }
}

/// Layout validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("vertex layout declares {0:?} more than once")]
    DuplicateSemantic(VertexSemantic),
    #[error("{semantic:?} refers to buffer {buffer_index} but the layout has {buffer_count} buffers")]
    BufferIndexOutOfRange {
        semantic: VertexSemantic,
        buffer_index: u8,
        buffer_count: u8,
    },
    #[error("buffer {0} has no attributes")]
    EmptyBuffer(u8),
    #[error("{semantic:?} overruns its stride ({end} > {stride})")]
    AttributeOverrunsStride {
        semantic: VertexSemantic,
        end: u32,
        stride: u32,
    },
}

/// Description of a (possibly multi-buffer) vertex buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferConfig {
    pub vertex_count: u32,
    pub buffer_count: u8,
    pub attributes: Vec<VertexAttributeConfig>,
}

impl VertexBufferConfig {
    pub fn new(vertex_count: u32, buffer_count: u8) -> Self {
        Self {
            vertex_count,
            buffer_count,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: VertexAttributeConfig) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Float3 positions in buffer 0 and normalized Short4 tangent frames in buffer 1
    pub fn position_and_tangents(vertex_count: u32) -> Self {
        Self::new(vertex_count, 2)
            .with_attribute(VertexAttributeConfig::new(
                VertexSemantic::Position,
                0,
                AttributeType::Float3,
            ))
            .with_attribute(
                VertexAttributeConfig::new(VertexSemantic::Tangents, 1, AttributeType::Short4)
                    .normalized(),
            )
    }

    /// [`Self::position_and_tangents`] plus Float4 colors in buffer 2
    pub fn position_tangents_and_colors(vertex_count: u32) -> Self {
        let mut config = Self::position_and_tangents(vertex_count).with_attribute(
            VertexAttributeConfig::new(VertexSemantic::Color, 2, AttributeType::Float4),
        );
        config.buffer_count = 3;
        config
    }

    pub fn attribute(&self, semantic: VertexSemantic) -> Option<&VertexAttributeConfig> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    pub fn has_semantic(&self, semantic: VertexSemantic) -> bool {
        self.attribute(semantic).is_some()
    }

    /// Attributes stored in one buffer slot
    pub fn attributes_in(&self, buffer_index: u8) -> impl Iterator<Item = &VertexAttributeConfig> {
        self.attributes
            .iter()
            .filter(move |a| a.buffer_index == buffer_index)
    }

    /// Byte stride of a buffer slot
    pub fn stride(&self, buffer_index: u8) -> Option<u32> {
        self.attributes_in(buffer_index)
            .map(|a| a.effective_stride())
            .max()
    }

    /// Expected byte size of the data uploaded to a buffer slot
    pub fn buffer_size(&self, buffer_index: u8) -> Option<u64> {
        self.stride(buffer_index)
            .map(|stride| u64::from(stride) * u64::from(self.vertex_count))
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        for (i, attribute) in self.attributes.iter().enumerate() {
            if self.attributes[..i]
                .iter()
                .any(|a| a.semantic == attribute.semantic)
            {
                return Err(LayoutError::DuplicateSemantic(attribute.semantic));
            }
            if attribute.buffer_index >= self.buffer_count {
                return Err(LayoutError::BufferIndexOutOfRange {
                    semantic: attribute.semantic,
                    buffer_index: attribute.buffer_index,
                    buffer_count: self.buffer_count,
                });
            }
            let end = attribute.offset + attribute.ty.size();
            let stride = attribute.effective_stride();
            if end > stride {
                return Err(LayoutError::AttributeOverrunsStride {
                    semantic: attribute.semantic,
                    end,
                    stride,
                });
            }
        }
        for slot in 0..self.buffer_count {
            if self.attributes_in(slot).next().is_none() {
                return Err(LayoutError::EmptyBuffer(slot));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    #[default]
    UShort,
    UInt,
}

impl IndexType {
    pub fn size(self) -> u32 {
        match self {
            IndexType::UShort => 2,
            IndexType::UInt => 4,
        }
    }

    pub fn index_format(self) -> IndexFormat {
        match self {
            IndexType::UShort => IndexFormat::Uint16,
            IndexType::UInt => IndexFormat::Uint32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferConfig {
    pub index_count: u32,
    pub index_type: IndexType,
}

impl IndexBufferConfig {
    pub fn new(index_count: u32, index_type: IndexType) -> Self {
        Self {
            index_count,
            index_type,
        }
    }

    pub fn byte_size(&self) -> u64 {
        u64::from(self.index_count) * u64::from(self.index_type.size())
    }
}

/// Axis-aligned bounding box used for culling
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub center: Vec3,
    pub half_extent: Vec3,
}

impl BoundingBox {
    pub fn new(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            center,
            half_extent,
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extent: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extent
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extent
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (c, e) = (self.center, self.half_extent);
        [
            c + Vec3::new(-e.x, -e.y, -e.z),
            c + Vec3::new(e.x, -e.y, -e.z),
            c + Vec3::new(-e.x, e.y, -e.z),
            c + Vec3::new(e.x, e.y, -e.z),
            c + Vec3::new(-e.x, -e.y, e.z),
            c + Vec3::new(e.x, -e.y, e.z),
            c + Vec3::new(-e.x, e.y, e.z),
            c + Vec3::new(e.x, e.y, e.z),
        ]
    }

    /// True when every corner lies outside one clip plane of `clip_from_local`.
    ///
    /// Conservative: a box straddling a frustum corner may still be kept.
    pub fn is_outside_clip(&self, clip_from_local: Mat4) -> bool {
        let clip: Vec<Vec4> = self
            .corners()
            .iter()
            .map(|c| clip_from_local * c.extend(1.0))
            .collect();
        let all = |outside: fn(&Vec4) -> bool| clip.iter().all(outside);
        all(|p| p.x < -p.w)
            || all(|p| p.x > p.w)
            || all(|p| p.y < -p.w)
            || all(|p| p.y > p.w)
            || all(|p| p.z < 0.0)
            || all(|p| p.z > p.w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    #[default]
    Triangles,
}

impl PrimitiveType {
    pub fn topology(self) -> PrimitiveTopology {
        match self {
            PrimitiveType::Points => PrimitiveTopology::PointList,
            PrimitiveType::Lines => PrimitiveTopology::LineList,
            PrimitiveType::Triangles => PrimitiveTopology::TriangleList,
        }
    }
}

/// Everything needed to draw one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderableConfig {
    pub bounding_box: BoundingBox,
    pub material: MaterialId,
    pub vertex_buffer: VertexBufferId,
    pub index_buffer: IndexBufferId,
    pub primitive: PrimitiveType,
    /// Skip drawing when the bounding box is outside the view
    pub culling: bool,
}

impl RenderableConfig {
    pub fn new(
        vertex_buffer: VertexBufferId,
        index_buffer: IndexBufferId,
        material: MaterialId,
    ) -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            material,
            vertex_buffer,
            index_buffer,
            primitive: PrimitiveType::Triangles,
            culling: true,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    pub fn with_primitive(mut self, primitive: PrimitiveType) -> Self {
        self.primitive = primitive;
        self
    }

    pub fn with_culling(mut self, culling: bool) -> Self {
        self.culling = culling;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_layouts_are_valid() {
        let layout = VertexBufferConfig::position_and_tangents(24);
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.buffer_size(0), Some(24 * 12));
        assert_eq!(layout.buffer_size(1), Some(24 * 8));
        assert_eq!(layout.buffer_size(2), None);

        let layout = VertexBufferConfig::position_tangents_and_colors(24);
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.buffer_size(2), Some(24 * 16));
    }

    #[test]
    fn tangents_map_to_snorm16() {
        let layout = VertexBufferConfig::position_and_tangents(4);
        let tangents = layout.attribute(VertexSemantic::Tangents).unwrap();
        assert_eq!(tangents.ty.vertex_format(tangents.normalized), VertexFormat::Snorm16x4);
        assert_eq!(AttributeType::Short4.vertex_format(false), VertexFormat::Sint16x4);
    }

    #[test]
    fn interleaved_buffer_uses_largest_stride() {
        let mut position = VertexAttributeConfig::new(VertexSemantic::Position, 0, AttributeType::Float3);
        position.stride = 20;
        let mut tangents =
            VertexAttributeConfig::new(VertexSemantic::Tangents, 0, AttributeType::Short4).normalized();
        tangents.offset = 12;
        tangents.stride = 20;

        let layout = VertexBufferConfig::new(3, 1)
            .with_attribute(position)
            .with_attribute(tangents);
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.stride(0), Some(20));
        assert_eq!(layout.buffer_size(0), Some(60));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let duplicate = VertexBufferConfig::position_and_tangents(1).with_attribute(
            VertexAttributeConfig::new(VertexSemantic::Position, 1, AttributeType::Float3),
        );
        assert_eq!(
            duplicate.validate(),
            Err(LayoutError::DuplicateSemantic(VertexSemantic::Position))
        );

        let mut out_of_range = VertexBufferConfig::position_and_tangents(1);
        out_of_range.buffer_count = 1;
        assert!(matches!(
            out_of_range.validate(),
            Err(LayoutError::BufferIndexOutOfRange { buffer_index: 1, .. })
        ));

        let mut empty = VertexBufferConfig::position_and_tangents(1);
        empty.buffer_count = 3;
        assert_eq!(empty.validate(), Err(LayoutError::EmptyBuffer(2)));

        let mut overrun = VertexAttributeConfig::new(VertexSemantic::Position, 0, AttributeType::Float3);
        overrun.offset = 4;
        overrun.stride = 12;
        let overrun = VertexBufferConfig::new(1, 1).with_attribute(overrun);
        assert!(matches!(
            overrun.validate(),
            Err(LayoutError::AttributeOverrunsStride { end: 16, stride: 12, .. })
        ));
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexBufferConfig::new(36, IndexType::UShort).byte_size(), 72);
        assert_eq!(IndexBufferConfig::new(36, IndexType::UInt).byte_size(), 144);
        assert_eq!(IndexType::UShort.index_format(), IndexFormat::Uint16);
    }

    #[test]
    fn bounding_box_corners() {
        let bounds = BoundingBox::new(Vec3::splat(-20.0), Vec3::splat(20.0));
        assert_eq!(bounds.min(), Vec3::splat(-40.0));
        assert_eq!(bounds.max(), Vec3::ZERO);
        assert_eq!(BoundingBox::from_min_max(bounds.min(), bounds.max()), bounds);
    }

    #[test]
    fn clip_test_against_perspective() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 1.0, 10.0);
        let clip = proj * view;

        let cube = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        assert!(!cube.is_outside_clip(clip));

        let behind = BoundingBox::new(Vec3::new(0.0, 0.0, 8.0), Vec3::ONE);
        assert!(behind.is_outside_clip(clip));

        let far_left = BoundingBox::new(Vec3::new(-50.0, 0.0, 0.0), Vec3::ONE);
        assert!(far_left.is_outside_clip(clip));

        let beyond_far = BoundingBox::new(Vec3::new(0.0, 0.0, -20.0), Vec3::ONE);
        assert!(beyond_far.is_outside_clip(clip));

        // Overlapping a corner of the view keeps it
        let straddling = BoundingBox::new(Vec3::splat(-20.0), Vec3::splat(20.0));
        assert!(!straddling.is_outside_clip(clip));
    }
}
