//! The cube's packed tangent frames, checked through the public decoding path

use glam::Vec3;
use lit_cube::packing::{snorm16_step, tangent_frames_as_snorm16};
use lit_cube::resources::{CubeFace, Mesh};
use lit_cube::{pack_tangent_frames_indexed, PackError};

// A few quantization steps of slack on every decoded axis
fn tolerance() -> f32 {
    8.0 * snorm16_step()
}

#[test]
fn every_vertex_decodes_to_its_face_basis() {
    let cube = Mesh::cube();
    for (i, frame) in cube.tangent_frames.iter().enumerate() {
        let face = CubeFace::ALL[i / 4];
        let expected = face.basis();
        let decoded = frame.to_basis();
        assert!(
            decoded.normal.abs_diff_eq(expected.normal, tolerance()),
            "vertex {i}: {:?} vs {:?}",
            decoded.normal,
            expected.normal
        );
        assert!(decoded.tangent.abs_diff_eq(expected.tangent, tolerance()));
        assert!(decoded.bitangent.abs_diff_eq(expected.bitangent, tolerance()));
    }
}

#[test]
fn faces_share_one_frame() {
    let cube = Mesh::cube();
    for face in cube.tangent_frames.chunks(4) {
        assert!(face.iter().all(|f| *f == face[0]));
    }
}

#[test]
fn right_handed_faces_carry_the_reflection_flag() {
    // normal = tangent × bitangent on every face, so (T × N) · B < 0
    let cube = Mesh::cube();
    for face in CubeFace::ALL {
        assert!(face.basis().is_reflected());
    }
    assert!(cube.tangent_frames.iter().all(|f| f.0[3] < 0));
}

#[test]
fn attribute_stream_is_flat_short4() {
    let cube = Mesh::cube();
    let flat = tangent_frames_as_snorm16(&cube.tangent_frames);
    assert_eq!(flat.len(), 24 * 4);
    assert_eq!(&flat[4..8], &cube.tangent_frames[1].0);
    assert_eq!(bytemuck::cast_slice::<i16, u8>(flat), cube.tangent_bytes());
}

#[test]
fn indexed_driver_matches_cube() {
    let bases: Vec<_> = CubeFace::ALL.iter().map(|f| f.basis()).collect();
    let faces: Vec<usize> = (0..24).map(|v| v / 4).collect();
    let mut mesh = Mesh::cube();
    let frames = pack_tangent_frames_indexed(&bases, &faces).unwrap();
    assert_eq!(frames, mesh.tangent_frames);

    let err = mesh.set_face_tangent_bases(&bases, &[0, 6]).unwrap_err();
    assert_eq!(
        err,
        PackError::FaceIndexOutOfRange {
            vertex: 1,
            face: 6,
            face_count: 6
        }
    );
}

#[test]
fn front_face_normal_points_at_default_camera() {
    let cube = Mesh::cube();
    let normal = cube.tangent_frames[0].to_basis().normal;
    assert!(normal.dot(Vec3::Z) > 0.999);
}
