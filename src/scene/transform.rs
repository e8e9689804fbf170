//! Transform component

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

/// Transform component for positioning objects in 3D space
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Default::default()
        }
    }

    /// Decompose an affine matrix into scale, rotation and translation
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Get the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Inverse transpose of the upper 3x3, padded to a Mat4 for uniform layout
    pub fn normal_matrix(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.matrix()).inverse().transpose())
    }

    /// Rotate around an axis
    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        let delta = Quat::from_axis_angle(axis, angle);
        self.rotation = delta * self.rotation;
    }

    /// Build uniform data for shaders
    pub fn uniform_data(&self) -> TransformUniformData {
        TransformUniformData {
            model: self.matrix(),
            normal_matrix: self.normal_matrix(),
        }
    }
}

/// Transform uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformUniformData {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn matrix_round_trips_through_decomposition() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.rotate_axis(Vec3::Y, 0.7);
        transform.scale = Vec3::splat(2.0);

        let decomposed = Transform::from_matrix(transform.matrix());
        assert!(decomposed.position.abs_diff_eq(transform.position, 1e-5));
        assert!(decomposed.scale.abs_diff_eq(transform.scale, 1e-5));
        assert!(decomposed.rotation.abs_diff_eq(transform.rotation, 1e-5));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let transform = Transform {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        };
        let n = transform.normal_matrix().transform_vector3(Vec3::X);
        assert!(n.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn rotate_axis_turns_forward() {
        let mut transform = Transform::default();
        transform.rotate_axis(Vec3::Y, FRAC_PI_2);
        let x = transform.matrix().transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }
}
