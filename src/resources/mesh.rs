//! Mesh data structures and generation

use crate::packing::{
    pack_tangent_frames, pack_tangent_frames_indexed, PackError, PackedTangentFrame, TangentBasis,
};
use crate::resources::BoundingBox;
use glam::{Vec3, Vec4};

/// One face of the axis-aligned cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Front,
    Back,
    Top,
    Bottom,
    Right,
    Left,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Back,
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Right,
        CubeFace::Left,
    ];

    /// Outward facing normal
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::Z,
            CubeFace::Back => Vec3::NEG_Z,
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
            CubeFace::Right => Vec3::X,
            CubeFace::Left => Vec3::NEG_X,
        }
    }

    /// Tangent basis of the face as seen from outside the cube.
    ///
    /// The tangent runs left to right and the bitangent bottom to top, so
    /// `normal = tangent × bitangent` for every face.
    pub fn basis(self) -> TangentBasis {
        let (tangent, bitangent) = match self {
            CubeFace::Front => (Vec3::X, Vec3::Y),
            CubeFace::Back => (Vec3::NEG_X, Vec3::Y),
            CubeFace::Top => (Vec3::X, Vec3::NEG_Z),
            CubeFace::Bottom => (Vec3::X, Vec3::Z),
            CubeFace::Right => (Vec3::NEG_Z, Vec3::Y),
            CubeFace::Left => (Vec3::Z, Vec3::Y),
        };
        TangentBasis::new(tangent, bitangent, self.normal())
    }

    /// Vertex color used by the vertex color material
    pub fn color(self) -> Vec4 {
        match self {
            CubeFace::Front => Vec4::new(1.0, 0.0, 0.0, 1.0),
            CubeFace::Back => Vec4::new(0.0, 1.0, 0.0, 1.0),
            CubeFace::Top => Vec4::new(1.0, 0.0, 1.0, 1.0),
            CubeFace::Bottom => Vec4::new(0.0, 1.0, 1.0, 1.0),
            CubeFace::Right => Vec4::new(0.0, 0.0, 1.0, 1.0),
            CubeFace::Left => Vec4::new(0.0, 0.5, 1.0, 1.0),
        }
    }

    /// Corner positions, counter-clockwise seen from outside
    fn corners(self) -> [Vec3; 4] {
        match self {
            CubeFace::Front => [
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(-1.0, 1.0, 1.0),
            ],
            CubeFace::Back => [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(1.0, 1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
            ],
            CubeFace::Top => [
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(-1.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, -1.0),
            ],
            CubeFace::Bottom => [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(-1.0, -1.0, 1.0),
            ],
            CubeFace::Right => [
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(1.0, 1.0, -1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
            ],
            CubeFace::Left => [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(-1.0, 1.0, 1.0),
                Vec3::new(-1.0, 1.0, -1.0),
            ],
        }
    }
}

/// A mesh with separate attribute streams and 16-bit indices
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub tangent_frames: Vec<PackedTangentFrame>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            positions: Vec::new(),
            colors: Vec::new(),
            tangent_frames: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Calculate vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Calculate index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Calculate triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Replace the tangent frames with one packed basis per vertex
    pub fn set_tangent_bases(&mut self, bases: &[TangentBasis]) {
        self.tangent_frames = pack_tangent_frames(bases);
    }

    /// Replace the tangent frames from per-face bases and a face index per vertex
    pub fn set_face_tangent_bases(
        &mut self,
        face_bases: &[TangentBasis],
        vertex_faces: &[usize],
    ) -> Result<(), PackError> {
        self.tangent_frames = pack_tangent_frames_indexed(face_bases, vertex_faces)?;
        Ok(())
    }

    /// Get position data as bytes
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Get color data as bytes
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Get packed tangent frame data as bytes
    pub fn tangent_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tangent_frames)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounds of the positions
    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.positions.first() else {
            return BoundingBox::default();
        };
        let (min, max) = self
            .positions
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        BoundingBox::from_min_max(min, max)
    }

    /// Create a cube of half extent 1 centered at origin.
    ///
    /// 24 vertices (4 per face) so each face carries its own tangent frame
    /// and color.
    pub fn cube() -> Self {
        let mut mesh = Mesh::new("cube");
        let mut bases = Vec::with_capacity(24);

        for face in CubeFace::ALL {
            mesh.positions.extend_from_slice(&face.corners());
            for _ in 0..4 {
                mesh.colors.push(face.color());
                bases.push(face.basis());
            }
        }

        mesh.set_tangent_bases(&bases);

        // Define indices (two triangles per face)
        for face in 0..CubeFace::ALL.len() as u16 {
            let base = face * 4;
            mesh.indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }

        log::debug!(
            "Generated {} mesh: {} vertices, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::snorm16_step;

    #[test]
    fn cube_counts() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.colors.len(), 24);
        assert_eq!(cube.tangent_frames.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
    }

    #[test]
    fn cube_byte_sizes() {
        let cube = Mesh::cube();
        assert_eq!(cube.position_bytes().len(), 24 * 12);
        assert_eq!(cube.color_bytes().len(), 24 * 16);
        assert_eq!(cube.tangent_bytes().len(), 24 * 8);
        assert_eq!(cube.index_bytes().len(), 36 * 2);
    }

    #[test]
    fn face_bases_are_orthonormal_right_handed() {
        for face in CubeFace::ALL {
            let basis = face.basis();
            assert!(basis.tangent.dot(basis.bitangent).abs() < 1e-6);
            assert!(basis.tangent.dot(basis.normal).abs() < 1e-6);
            assert!(basis.tangent.cross(basis.bitangent).abs_diff_eq(basis.normal, 1e-6));
        }
    }

    #[test]
    fn face_corners_lie_on_face_plane() {
        for face in CubeFace::ALL {
            for corner in face.corners() {
                assert_eq!(corner.dot(face.normal()), 1.0, "{face:?}");
            }
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        let cube = Mesh::cube();
        for (tri, face) in cube.indices.chunks(6).zip(CubeFace::ALL) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| cube.positions[i as usize]);
            let winding_normal = (b - a).cross(c - a).normalize();
            assert!(winding_normal.abs_diff_eq(face.normal(), 1e-6), "{face:?}");
        }
    }

    #[test]
    fn cube_tangent_frames_decode_to_face_normals() {
        let cube = Mesh::cube();
        for (vertex, frame) in cube.tangent_frames.iter().enumerate() {
            let face = CubeFace::ALL[vertex / 4];
            assert_ne!(frame.0[3], 0);
            let decoded = frame.to_basis();
            assert!(
                decoded.normal.abs_diff_eq(face.normal(), 3.0 * snorm16_step()),
                "{face:?}: {decoded:?}"
            );
        }
    }

    #[test]
    fn face_indexed_frames_match_per_vertex_frames() {
        let cube = Mesh::cube();
        let face_bases: Vec<_> = CubeFace::ALL.iter().map(|f| f.basis()).collect();
        let vertex_faces: Vec<_> = (0..24).map(|v| v / 4).collect();

        let mut indexed = Mesh::cube();
        indexed.set_face_tangent_bases(&face_bases, &vertex_faces).unwrap();
        assert_eq!(indexed.tangent_frames, cube.tangent_frames);
    }

    #[test]
    fn bounding_box_of_cube() {
        let bounds = Mesh::cube().bounding_box();
        assert_eq!(bounds.center, Vec3::ZERO);
        assert_eq!(bounds.half_extent, Vec3::ONE);
        assert_eq!(Mesh::new("empty").bounding_box(), BoundingBox::default());
    }
}
