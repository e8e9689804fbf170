//! Scene management
//!
//! Renderables and lights are entities in a `bevy_ecs` world; the camera and
//! clear color live beside it.

mod camera;
mod light;
mod transform;

pub use camera::*;
pub use light::*;
pub use transform::*;

use crate::resources::RenderableConfig;
use bevy_ecs::prelude::*;

/// Default background, a dark blue
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.1, 0.2, 1.0];

/// Renderable component
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub config: RenderableConfig,
    pub visible: bool,
}

/// Handle to a renderable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableId(pub(crate) Entity);

/// Handle to a light entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub(crate) Entity);

/// The scene containing all renderable content
pub struct Scene {
    world: World,
    pub camera: Camera,
    pub clear_color: [f32; 4],
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            camera: Camera::default(),
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }

    /// Spawn a renderable with an identity transform
    pub fn add_renderable(&mut self, config: RenderableConfig) -> RenderableId {
        let entity = self
            .world
            .spawn((
                Renderable {
                    config,
                    visible: true,
                },
                Transform::default(),
            ))
            .id();
        RenderableId(entity)
    }

    /// Despawn a renderable, returns false if it did not exist
    pub fn remove_renderable(&mut self, id: RenderableId) -> bool {
        self.world.get::<Renderable>(id.0).is_some() && self.world.despawn(id.0)
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) -> LightId {
        LightId(self.world.spawn(light).id())
    }

    pub fn remove_light(&mut self, id: LightId) -> bool {
        self.world.get::<DirectionalLight>(id.0).is_some() && self.world.despawn(id.0)
    }

    pub fn renderable(&self, id: RenderableId) -> Option<&Renderable> {
        self.world.get::<Renderable>(id.0)
    }

    pub fn transform(&self, id: RenderableId) -> Option<Transform> {
        self.world.get::<Transform>(id.0).copied()
    }

    /// Replace the transform of a renderable, returns false if it does not exist
    pub fn set_transform(&mut self, id: RenderableId, transform: Transform) -> bool {
        match self.world.get_mut::<Transform>(id.0) {
            Some(mut current) => {
                *current = transform;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: RenderableId, visible: bool) -> bool {
        match self.world.get_mut::<Renderable>(id.0) {
            Some(mut renderable) => {
                renderable.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all renderables in creation order
    pub fn renderables(&mut self) -> Vec<(RenderableId, Renderable, Transform)> {
        let mut query = self.world.query::<(Entity, &Renderable, &Transform)>();
        let mut items: Vec<_> = query
            .iter(&self.world)
            .map(|(entity, renderable, transform)| (RenderableId(entity), *renderable, *transform))
            .collect();
        items.sort_by_key(|(id, _, _)| id.0);
        items
    }

    pub fn renderable_count(&mut self) -> usize {
        let mut query = self.world.query::<&Renderable>();
        query.iter(&self.world).count()
    }

    pub fn directional_lights(&mut self) -> Vec<DirectionalLight> {
        let mut query = self.world.query::<(Entity, &DirectionalLight)>();
        let mut lights: Vec<_> = query.iter(&self.world).map(|(e, l)| (e, *l)).collect();
        lights.sort_by_key(|(entity, _)| *entity);
        lights.into_iter().map(|(_, light)| light).collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
