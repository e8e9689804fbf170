//! Material definitions

use crate::resources::VertexSemantic;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Shading model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    /// Diffuse lighting from directional lights, normal decoded from the
    /// packed tangent frame
    #[default]
    Lit,
    /// Unlit, outputs the interpolated vertex color
    VertexColor,
}

impl MaterialKind {
    /// Vertex attributes a renderable must provide to use this material
    pub fn required_semantics(self) -> &'static [VertexSemantic] {
        match self {
            MaterialKind::Lit => &[VertexSemantic::Position, VertexSemantic::Tangents],
            MaterialKind::VertexColor => &[VertexSemantic::Position, VertexSemantic::Color],
        }
    }
}

/// Surface description handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    /// Base color in sRGB space
    pub base_color: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            kind: MaterialKind::Lit,
            base_color: Vec3::ONE,
        }
    }
}

impl Material {
    pub fn new(name: &str, kind: MaterialKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ..Default::default()
        }
    }

    /// White lit material
    pub fn lit() -> Self {
        Self::new("lit", MaterialKind::Lit)
    }

    pub fn vertex_color() -> Self {
        Self::new("vertex_color", MaterialKind::VertexColor)
    }

    /// Set the base color (sRGB)
    pub fn with_base_color(mut self, srgb: Vec3) -> Self {
        self.base_color = srgb;
        self
    }

    /// Base color converted to linear space
    pub fn base_color_linear(&self) -> Vec3 {
        Vec3::new(
            srgb_to_linear(self.base_color.x),
            srgb_to_linear(self.base_color.y),
            srgb_to_linear(self.base_color.z),
        )
    }

    /// Create a uniform data struct for GPU
    pub fn uniform_data(&self) -> MaterialUniformData {
        MaterialUniformData {
            base_color: self.base_color_linear().extend(1.0),
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniformData {
    pub base_color: Vec4, // rgb=linear base color, a=unused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_conversion() {
        let material = Material::lit().with_base_color(Vec3::new(0.0, 0.5, 1.0));
        let linear = material.base_color_linear();
        assert_eq!(linear.x, 0.0);
        assert!((linear.y - 0.214).abs() < 1e-3);
        assert!((linear.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn required_semantics_by_kind() {
        assert!(MaterialKind::Lit
            .required_semantics()
            .contains(&VertexSemantic::Tangents));
        assert!(!MaterialKind::Lit
            .required_semantics()
            .contains(&VertexSemantic::Color));
        assert!(MaterialKind::VertexColor
            .required_semantics()
            .contains(&VertexSemantic::Color));
    }

    #[test]
    fn uniform_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<MaterialUniformData>(), 16);
        assert_eq!(Material::default().uniform_data().base_color, Vec4::ONE);
    }
}
