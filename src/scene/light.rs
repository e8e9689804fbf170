//! Light types for the scene

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Most directional lights the lit shader evaluates
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Directional light component (like the sun)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    /// Illuminance in lux
    pub intensity: f32,
    /// Direction the light travels
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 100_000.0,
            direction: Vec3::NEG_Z,
        }
    }
}

impl DirectionalLight {
    pub fn new(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            color,
            intensity,
            direction: direction.normalize_or_zero(),
        }
    }
}

/// Lighting uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniformData {
    /// xyz = direction towards the light
    pub directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    /// rgb = color * intensity * exposure
    pub colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    /// x = light count
    pub count: [u32; 4],
}

impl LightingUniformData {
    /// Pack up to [`MAX_DIRECTIONAL_LIGHTS`] lights, pre-exposed
    pub fn new<'a>(lights: impl IntoIterator<Item = &'a DirectionalLight>, exposure: f32) -> Self {
        let mut data = Self::zeroed();
        let mut count = 0;
        for light in lights.into_iter().take(MAX_DIRECTIONAL_LIGHTS) {
            data.directions[count] = (-light.direction).extend(0.0);
            data.colors[count] = (light.color * light.intensity * exposure).extend(1.0);
            count += 1;
        }
        data.count[0] = count as u32;
        data
    }
}
