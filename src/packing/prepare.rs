//! Per-vertex tangent frame preparation
//!
//! Turns the tangent bases of a mesh into the `Short4` attribute stream the
//! renderer uploads. Every vertex is independent of the others.

use super::tangent_frame::{PackedTangentFrame, TangentBasis};
use thiserror::Error;

/// Tangent frame preparation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("Vertex {vertex} references face {face}, but only {face_count} face bases exist")]
    FaceIndexOutOfRange {
        vertex: usize,
        face: usize,
        face_count: usize,
    },
}

/// Pack one basis per vertex.
pub fn pack_tangent_frames(bases: &[TangentBasis]) -> Vec<PackedTangentFrame> {
    bases.iter().map(PackedTangentFrame::from_basis).collect()
}

/// Pack per-face bases for vertices that reference their face by index.
///
/// Each face basis is packed once and shared by all of its vertices.
pub fn pack_tangent_frames_indexed(
    face_bases: &[TangentBasis],
    vertex_faces: &[usize],
) -> Result<Vec<PackedTangentFrame>, PackError> {
    let packed_faces = pack_tangent_frames(face_bases);

    vertex_faces
        .iter()
        .enumerate()
        .map(|(vertex, &face)| {
            packed_faces
                .get(face)
                .copied()
                .ok_or(PackError::FaceIndexOutOfRange {
                    vertex,
                    face,
                    face_count: packed_faces.len(),
                })
        })
        .collect()
}

/// Flat `[x0, y0, z0, w0, x1, ...]` view of packed frames
pub fn tangent_frames_as_snorm16(frames: &[PackedTangentFrame]) -> &[i16] {
    bytemuck::cast_slice(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn front() -> TangentBasis {
        TangentBasis::new(Vec3::X, Vec3::Y, Vec3::Z)
    }

    fn right() -> TangentBasis {
        TangentBasis::new(Vec3::NEG_Z, Vec3::Y, Vec3::X)
    }

    #[test]
    fn one_frame_per_vertex() {
        let frames = pack_tangent_frames(&[front(), right(), front()]);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], frames[2]);
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn indexed_vertices_share_face_frames() {
        let frames = pack_tangent_frames_indexed(&[front(), right()], &[0, 0, 1, 1, 0]).unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0], PackedTangentFrame::from_basis(&front()));
        assert_eq!(frames[2], PackedTangentFrame::from_basis(&right()));
        assert_eq!(frames[4], frames[1]);
    }

    #[test]
    fn indexed_rejects_unknown_face() {
        let err = pack_tangent_frames_indexed(&[front()], &[0, 3]).unwrap_err();
        assert_eq!(
            err,
            PackError::FaceIndexOutOfRange {
                vertex: 1,
                face: 3,
                face_count: 1,
            }
        );
    }

    #[test]
    fn flat_layout_is_xyzw_per_vertex() {
        let frames = pack_tangent_frames(&[front(), right()]);
        let shorts = tangent_frames_as_snorm16(&frames);
        assert_eq!(shorts.len(), 8);
        assert_eq!(&shorts[0..4], &[0, 0, 0, -32767]);
        assert_eq!(&shorts[4..8], &frames[1].0);
    }

    #[test]
    fn empty_input_packs_nothing() {
        assert!(pack_tangent_frames(&[]).is_empty());
        assert!(pack_tangent_frames_indexed(&[], &[]).unwrap().is_empty());
    }
}
