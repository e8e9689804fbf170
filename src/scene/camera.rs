//! Camera system

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 10.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Orthographic projection whose vertical extent is `height` and whose
    /// width follows the aspect ratio
    pub fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Self {
        let half_h = height / 2.0;
        let half_w = half_h * aspect;
        Projection::Orthographic {
            left: -half_w,
            right: half_w,
            bottom: -half_h,
            top: half_h,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }

    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. } => *near,
            Projection::Orthographic { near, .. } => *near,
        }
    }

    pub fn far(&self) -> f32 {
        match self {
            Projection::Perspective { far, .. } => *far,
            Projection::Orthographic { far, .. } => *far,
        }
    }

    /// Update the aspect ratio; orthographic bounds keep their height
    pub fn set_aspect(&mut self, new_aspect: f32) {
        match self {
            Projection::Perspective { aspect, .. } => *aspect = new_aspect,
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                ..
            } => {
                let half_w = (*top - *bottom) * 0.5 * new_aspect;
                let center = (*left + *right) * 0.5;
                *left = center - half_w;
                *right = center + half_w;
            }
        }
    }
}

/// Photographic exposure settings.
///
/// Light intensities are physical (lux), so the shaders scale them by the
/// exposure these settings produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exposure {
    /// f-stop
    pub aperture: f32,
    /// Seconds
    pub shutter_speed: f32,
    /// ISO
    pub sensitivity: f32,
}

impl Default for Exposure {
    fn default() -> Self {
        Self {
            aperture: 16.0,
            shutter_speed: 1.0 / 125.0,
            sensitivity: 100.0,
        }
    }
}

impl Exposure {
    /// EV at ISO 100
    pub fn ev100(&self) -> f32 {
        ((self.aperture * self.aperture) / self.shutter_speed * 100.0 / self.sensitivity).log2()
    }

    /// Factor that maps luminance to normalized pixel values
    pub fn multiplier(&self) -> f32 {
        1.0 / (1.2 * 2f32.powf(self.ev100()))
    }
}

/// Camera for viewing the scene
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    pub exposure: Exposure,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 4.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::default(),
            exposure: Exposure::default(),
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    /// Place the camera at `eye` looking at `center`
    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.position = eye;
        self.target = center;
        self.up = up;
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Build camera uniform data for shaders
    pub fn uniform_data(&self) -> CameraUniformData {
        let view = self.view_matrix();
        let proj = self.projection_matrix();

        CameraUniformData {
            view,
            proj,
            view_proj: proj * view,
            position: self.position.extend(1.0),
            near_far: Vec4::new(self.projection.near(), self.projection.far(), 0.0, 0.0),
        }
    }

    /// Update aspect ratio from a viewport size
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.projection.set_aspect(width / height);
        }
    }
}

/// Camera uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub position: Vec4,
    pub near_far: Vec4, // x=near, y=far
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sees_origin() {
        let camera = Camera::default();
        let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn cube_fits_between_near_and_far() {
        // Eye at z=4 with near 1 and far 10 keeps the unit cube inside
        let camera = Camera::default();
        for z in [-1.0, 1.0] {
            let clip = camera.view_projection_matrix() * Vec4::new(0.0, 0.0, z, 1.0);
            let depth = clip.z / clip.w;
            assert!((0.0..=1.0).contains(&depth), "z={z} depth={depth}");
        }
    }

    #[test]
    fn set_aspect_updates_perspective() {
        let mut camera = Camera::default();
        camera.set_aspect(800.0, 400.0);
        match camera.projection {
            Projection::Perspective { aspect, .. } => assert_eq!(aspect, 2.0),
            _ => panic!("expected perspective"),
        }
        // Degenerate height is ignored
        let before = camera.projection;
        camera.set_aspect(800.0, 0.0);
        assert_eq!(camera.projection, before);
    }

    #[test]
    fn orthographic_aspect_keeps_height() {
        let mut projection = Projection::orthographic(4.0, 1.0, 1.0, 10.0);
        projection.set_aspect(2.0);
        assert_eq!(projection, Projection::orthographic(4.0, 2.0, 1.0, 10.0));
    }

    #[test]
    fn default_exposure() {
        let exposure = Exposure::default();
        assert!((exposure.ev100() - 14.966).abs() < 1e-3);
        // Sunlight-level illuminance lands in a displayable range
        let scaled = 115_000.0 * exposure.multiplier();
        assert!(scaled > 2.0 && scaled < 4.0, "{scaled}");
    }
}
