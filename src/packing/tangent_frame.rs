//! Tangent frame to quaternion packing
//!
//! A tangent frame (tangent, bitangent, normal) is stored per vertex as a
//! single quaternion. The rotation part rebuilds the tangent and normal; the
//! sign of `w` records whether the bitangent has to be mirrored.

use super::snorm::{pack_snorm16, unpack_snorm16};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Quat, Vec3};

/// Smallest magnitude `w` may take after packing.
pub const TANGENT_FRAME_EPSILON: f32 = 0.000015;

/// Per-vertex tangent space basis.
///
/// The three vectors are expected to be unit length and mutually orthogonal.
/// This is not checked: a malformed basis packs to a meaningless (but finite
/// or NaN, never panicking) quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentBasis {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl TangentBasis {
    pub const fn new(tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Self {
        Self {
            tangent,
            bitangent,
            normal,
        }
    }

    /// Build from a matrix whose columns are tangent, bitangent and normal
    pub fn from_mat3(m: Mat3) -> Self {
        Self::new(m.x_axis, m.y_axis, m.z_axis)
    }

    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols(self.tangent, self.bitangent, self.normal)
    }

    /// Whether packing flags this basis as mirrored.
    ///
    /// True when the bitangent points against `tangent × normal`, which is the
    /// case for the usual `normal = tangent × bitangent` frames.
    pub fn is_reflected(&self) -> bool {
        self.tangent.cross(self.normal).dot(self.bitangent) < 0.0
    }

    pub fn pack(&self) -> Quat {
        pack_tangent_frame(self)
    }
}

fn normalize_or_unscaled(q: Quat) -> Quat {
    let length = q.length();
    if length > 0.0 {
        q * length.recip()
    } else {
        q
    }
}

/// Encode a tangent basis as a unit quaternion.
///
/// The rotation maps the canonical axes to `tangent`, `normal × tangent` and
/// `normal`; the original bitangent only decides the sign. The result always
/// has `|w| >= TANGENT_FRAME_EPSILON`, and `w < 0` exactly when
/// [`TangentBasis::is_reflected`] holds.
pub fn pack_tangent_frame(basis: &TangentBasis) -> Quat {
    let TangentBasis {
        tangent,
        bitangent,
        normal,
    } = *basis;

    let rotation = Mat3::from_cols(tangent, normal.cross(tangent), normal);
    let mut q = normalize_or_unscaled(Quat::from_mat3(&rotation));

    if q.w < 0.0 {
        q = -q;
    }

    // w must never be zero, its sign carries the reflection flag
    if q.w < TANGENT_FRAME_EPSILON {
        let factor = (1.0 - TANGENT_FRAME_EPSILON * TANGENT_FRAME_EPSILON).sqrt();
        q = Quat::from_xyzw(
            q.x * factor,
            q.y * factor,
            q.z * factor,
            TANGENT_FRAME_EPSILON,
        );
    }

    // The clamp above runs first on purpose; negation keeps |w| intact.
    if tangent.cross(normal).dot(bitangent) < 0.0 {
        q = -q;
    }

    q
}

/// Decode a packed quaternion back into a tangent basis.
///
/// Accepts quaternions that lost precision in storage; the input is
/// renormalized first.
pub fn unpack_tangent_frame(q: Quat) -> TangentBasis {
    let rotation = Mat3::from_quat(normalize_or_unscaled(q));
    let tangent = rotation.x_axis;
    let normal = rotation.z_axis;

    let bitangent = if q.w < 0.0 {
        normal.cross(tangent)
    } else {
        tangent.cross(normal)
    };

    TangentBasis::new(tangent, bitangent, normal)
}

/// Quantized tangent frame as uploaded to the GPU (`x, y, z, w` as snorm16).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedTangentFrame(pub [i16; 4]);

impl PackedTangentFrame {
    /// Quantize every component of `q`.
    ///
    /// `w` is never stored as zero: if it rounds to zero it becomes one step
    /// with the sign of the float value.
    pub fn from_quat(q: Quat) -> Self {
        let [x, y, z, w] = q.to_array();

        let packed_w = match pack_snorm16(w) {
            0 if w < 0.0 => -1,
            0 => 1,
            packed => packed,
        };

        Self([pack_snorm16(x), pack_snorm16(y), pack_snorm16(z), packed_w])
    }

    pub fn from_basis(basis: &TangentBasis) -> Self {
        Self::from_quat(pack_tangent_frame(basis))
    }

    /// Dequantize to a (nearly) unit quaternion
    pub fn to_quat(self) -> Quat {
        let [x, y, z, w] = self.0;
        Quat::from_xyzw(
            unpack_snorm16(x),
            unpack_snorm16(y),
            unpack_snorm16(z),
            unpack_snorm16(w),
        )
    }

    pub fn to_basis(self) -> TangentBasis {
        unpack_tangent_frame(self.to_quat())
    }

    pub fn is_reflected(self) -> bool {
        self.0[3] < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    fn assert_vec3_near(actual: Vec3, expected: Vec3, tolerance: f32) {
        assert!(
            actual.abs_diff_eq(expected, tolerance),
            "{actual:?} differs from {expected:?} by more than {tolerance}"
        );
    }

    #[test]
    fn identity_frame_is_flagged_reflected() {
        let basis = TangentBasis::new(Vec3::X, Vec3::Y, Vec3::Z);
        assert!(basis.is_reflected());

        let q = pack_tangent_frame(&basis);
        assert!(q.abs_diff_eq(Quat::from_xyzw(0.0, 0.0, 0.0, -1.0), 1e-6));
        assert_eq!(PackedTangentFrame::from_quat(q).0, [0, 0, 0, -32767]);
    }

    #[test]
    fn identity_rotation_with_unflipped_bitangent_packs_to_identity() {
        // bitangent = tangent x normal keeps w positive
        let basis = TangentBasis::new(Vec3::X, Vec3::NEG_Y, Vec3::Z);
        assert!(!basis.is_reflected());

        let q = pack_tangent_frame(&basis);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert_eq!(PackedTangentFrame::from_quat(q).0, [0, 0, 0, 32767]);
    }

    #[test]
    fn mirrored_bitangent_only_flips_sign() {
        let rotation = Mat3::from_quat(Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.2, 2.0));
        let basis = TangentBasis::from_mat3(rotation);
        let mirrored = TangentBasis {
            bitangent: -basis.bitangent,
            ..basis
        };

        let q = pack_tangent_frame(&basis);
        let q_mirrored = pack_tangent_frame(&mirrored);
        assert!(q.abs_diff_eq(-q_mirrored, 1e-7));
        assert_ne!(q.w < 0.0, q_mirrored.w < 0.0);
    }

    #[test]
    fn half_turn_gets_epsilon_w() {
        // 180 degrees about +X: w would be exactly zero
        let basis = TangentBasis::new(Vec3::X, Vec3::Y, Vec3::NEG_Z);
        assert!(!basis.is_reflected());

        let q = pack_tangent_frame(&basis);
        assert_eq!(q.w, TANGENT_FRAME_EPSILON);
        assert!((q.length() - 1.0).abs() < 1e-6);
        assert!((q.x.abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reflected_half_turn_keeps_epsilon_magnitude() {
        // 180 degrees about +Y with a mirrored bitangent: the epsilon clamp
        // happens before the reflection flip.
        let basis = TangentBasis::new(Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z);
        assert!(basis.is_reflected());

        let q = pack_tangent_frame(&basis);
        assert_eq!(q.w, -TANGENT_FRAME_EPSILON);
        assert!(q.w.abs() >= TANGENT_FRAME_EPSILON);

        let packed = PackedTangentFrame::from_quat(q);
        assert_eq!(packed.0[3], -1);
        assert!(packed.is_reflected());
    }

    #[test]
    fn near_half_turns_never_drop_below_epsilon() {
        for step in 0..64 {
            let angle = PI - step as f32 * 1e-6;
            for axis in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE.normalize()] {
                let basis = TangentBasis::from_mat3(Mat3::from_axis_angle(axis, angle));
                let q = pack_tangent_frame(&basis);
                assert!(q.w.abs() >= TANGENT_FRAME_EPSILON, "{q:?}");
                assert!(q.w < 0.0);
                assert!((q.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn degenerate_basis_does_not_panic() {
        // tangent parallel to normal
        let basis = TangentBasis::new(Vec3::Y, Vec3::Z, Vec3::NEG_Y);
        let q = pack_tangent_frame(&basis);
        assert!(q.is_finite());

        let zero = TangentBasis::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        let _ = PackedTangentFrame::from_basis(&zero);
    }

    #[test]
    fn unpack_restores_quarter_turn() {
        let basis = TangentBasis::from_mat3(Mat3::from_rotation_z(FRAC_PI_2));
        let restored = unpack_tangent_frame(pack_tangent_frame(&basis));
        assert_vec3_near(restored.tangent, basis.tangent, 1e-6);
        assert_vec3_near(restored.bitangent, basis.bitangent, 1e-6);
        assert_vec3_near(restored.normal, basis.normal, 1e-6);
    }

    #[test]
    fn packed_w_zero_takes_sign_of_float() {
        let positive = PackedTangentFrame::from_quat(Quat::from_xyzw(1.0, 0.0, 0.0, 0.000015));
        let negative = PackedTangentFrame::from_quat(Quat::from_xyzw(-1.0, 0.0, 0.0, -0.000015));
        assert_eq!(positive.0, [32767, 0, 0, 1]);
        assert_eq!(negative.0, [-32767, 0, 0, -1]);
    }

    #[test]
    fn packed_frame_is_eight_bytes() {
        assert_eq!(std::mem::size_of::<PackedTangentFrame>(), 8);
        let frame = PackedTangentFrame([1, -2, 3, -4]);
        let shorts: &[i16] = bytemuck::cast_slice(std::slice::from_ref(&frame));
        assert_eq!(shorts, &[1, -2, 3, -4]);
    }

    fn rotation() -> impl Strategy<Value = Mat3> {
        (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, 0.0f32..TAU)
            .prop_filter("rotation axis must not be degenerate", |(x, y, z, _)| {
                Vec3::new(*x, *y, *z).length_squared() > 1e-4
            })
            .prop_map(|(x, y, z, angle)| {
                Mat3::from_axis_angle(Vec3::new(x, y, z).normalize(), angle)
            })
    }

    fn basis(rotation: Mat3, mirrored: bool) -> TangentBasis {
        let basis = TangentBasis::from_mat3(rotation);
        if mirrored {
            TangentBasis {
                bitangent: -basis.bitangent,
                ..basis
            }
        } else {
            basis
        }
    }

    proptest! {
        #[test]
        fn packed_frames_are_unit_length(r in rotation(), mirrored in any::<bool>()) {
            let q = pack_tangent_frame(&basis(r, mirrored));
            prop_assert!((q.length() - 1.0).abs() < 1e-5, "{:?}", q);
        }

        #[test]
        fn w_magnitude_never_below_epsilon(r in rotation(), mirrored in any::<bool>()) {
            let q = pack_tangent_frame(&basis(r, mirrored));
            prop_assert!(q.w.abs() >= TANGENT_FRAME_EPSILON, "{:?}", q);
        }

        #[test]
        fn sign_of_w_matches_reflection(r in rotation(), mirrored in any::<bool>()) {
            let basis = basis(r, mirrored);
            let q = pack_tangent_frame(&basis);
            prop_assert_eq!(q.w < 0.0, basis.is_reflected());
            // right-handed rotation columns have normal = tangent x bitangent
            prop_assert_eq!(basis.is_reflected(), !mirrored);
        }

        #[test]
        fn unpack_inverts_pack(r in rotation(), mirrored in any::<bool>()) {
            let basis = basis(r, mirrored);
            let restored = unpack_tangent_frame(pack_tangent_frame(&basis));
            prop_assert!(restored.tangent.abs_diff_eq(basis.tangent, 1e-4), "{:?} vs {:?}", restored, basis);
            prop_assert!(restored.bitangent.abs_diff_eq(basis.bitangent, 1e-4), "{:?} vs {:?}", restored, basis);
            prop_assert!(restored.normal.abs_diff_eq(basis.normal, 1e-4), "{:?} vs {:?}", restored, basis);
        }

        #[test]
        fn quantized_frames_decode_close_to_source(r in rotation(), mirrored in any::<bool>()) {
            let basis = basis(r, mirrored);
            let packed = PackedTangentFrame::from_basis(&basis);
            prop_assert_eq!(packed.is_reflected(), basis.is_reflected());
            prop_assert_ne!(packed.0[3], 0);

            let restored = packed.to_basis();
            prop_assert!(restored.normal.abs_diff_eq(basis.normal, 1e-3), "{:?} vs {:?}", restored, basis);
            prop_assert!(restored.tangent.abs_diff_eq(basis.tangent, 1e-3), "{:?} vs {:?}", restored, basis);
            prop_assert!(restored.bitangent.abs_diff_eq(basis.bitangent, 1e-3), "{:?} vs {:?}", restored, basis);
        }
    }
}
