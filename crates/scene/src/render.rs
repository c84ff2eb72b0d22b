use foundation::bounds::Ray;
use foundation::math::Vec3;
use streaming::tile::TileCoord;

use crate::entity::EntityHandle;

/// Non-owning reference the render scene keeps for something it draws.
///
/// Entity handles are generational: once the registry drops an entity, its
/// handle no longer resolves even if the scene still holds it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneNode {
    Tile(TileCoord),
    Entity(EntityHandle),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TranslationFunction {
    #[default]
    Linear,
    Ease,
}

/// Animated camera move request, executed by the external animation system.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Translation {
    pub duration_s: f64,
    pub function: TranslationFunction,
}

impl Translation {
    /// A negative (or NaN) duration means "no animation".
    pub fn from_duration(duration_s: f64, function: TranslationFunction) -> Option<Self> {
        (duration_s >= 0.0).then_some(Self {
            duration_s,
            function,
        })
    }
}

/// Row-major rotation matrix.
pub type Rotation = [[f64; 4]; 4];

pub trait Camera {
    fn position(&self) -> Vec3;
    /// `None` places the camera immediately.
    fn set_position(&mut self, position: Vec3, translation: Option<Translation>);
    fn set_orientation(&mut self, rotation: Rotation, duration_s: f64);
}

/// The rendering engine's scene graph.
///
/// Every call happens on the update thread.
pub trait RenderScene {
    type Camera: Camera;

    fn add_node(&mut self, node: SceneNode, position: Vec3);
    fn remove_node(&mut self, node: SceneNode);
    fn move_node(&mut self, node: SceneNode, position: Vec3);
    /// Binds the texture resource `texture_sid` to a tile node.
    fn set_tile_texture(&mut self, coord: TileCoord, texture_sid: &str);

    /// World-space ray under a screen position.
    fn cast_ray(&self, screen_x: f64, screen_y: f64) -> Ray;
    fn distance_from_camera(&self, node: SceneNode) -> f64;

    fn camera(&self) -> &Self::Camera;
    fn camera_mut(&mut self) -> &mut Self::Camera;

    /// Draw step, run after the geo scene has been updated for the frame.
    fn render_step(&mut self) {}
}
