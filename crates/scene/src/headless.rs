//! In-memory render engine stand-ins.
//!
//! `RecordingScene` keeps the node set and camera history so the geo scene can
//! be driven without a GPU.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use foundation::bounds::Ray;
use foundation::math::Vec3;
use parking_lot::Mutex;
use streaming::tile::TileCoord;
use tracing::trace;

use crate::render::{Camera, RenderScene, Rotation, SceneNode, Translation};
use crate::resources::{
    Color, Material, MaterialHandle, Mesh, MeshHandle, ResourceError, ResourceProvider,
};

/// Focal length, in pixels, of the default downward-looking pick camera.
pub const DEFAULT_FOCAL_PX: f64 = 1000.0;

const IDENTITY: Rotation = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[derive(Debug, Clone, PartialEq)]
pub struct CameraMove {
    pub position: Vec3,
    pub translation: Option<Translation>,
}

#[derive(Debug, Clone)]
pub struct RecordingCamera {
    position: Vec3,
    orientation: Rotation,
    rotation_duration_s: f64,
    moves: Vec<CameraMove>,
}

impl Default for RecordingCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: IDENTITY,
            rotation_duration_s: 0.0,
            moves: Vec::new(),
        }
    }
}

impl RecordingCamera {
    pub fn moves(&self) -> &[CameraMove] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&CameraMove> {
        self.moves.last()
    }

    pub fn orientation(&self) -> Rotation {
        self.orientation
    }

    pub fn rotation_duration_s(&self) -> f64 {
        self.rotation_duration_s
    }
}

impl Camera for RecordingCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    // Animations complete instantly.
    fn set_position(&mut self, position: Vec3, translation: Option<Translation>) {
        self.position = position;
        self.moves.push(CameraMove {
            position,
            translation,
        });
    }

    fn set_orientation(&mut self, rotation: Rotation, duration_s: f64) {
        self.orientation = rotation;
        self.rotation_duration_s = duration_s;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    nodes: BTreeMap<SceneNode, Vec3>,
    camera: RecordingCamera,
    pick_ray: Option<Ray>,
    distances: BTreeMap<SceneNode, f64>,
    textures: BTreeMap<TileCoord, String>,
    frames: u64,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: SceneNode) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn position(&self, node: SceneNode) -> Option<Vec3> {
        self.nodes.get(&node).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (SceneNode, Vec3)> + '_ {
        self.nodes.iter().map(|(n, p)| (*n, *p))
    }

    pub fn tile_count(&self) -> usize {
        self.nodes
            .keys()
            .filter(|n| matches!(n, SceneNode::Tile(_)))
            .count()
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len() - self.tile_count()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Texture currently bound to a tile.
    pub fn texture(&self, coord: TileCoord) -> Option<&str> {
        self.textures.get(&coord).map(String::as_str)
    }

    /// Ray returned by `cast_ray` regardless of screen position.
    pub fn set_pick_ray(&mut self, ray: Option<Ray>) {
        self.pick_ray = ray;
    }

    /// Overrides the camera distance reported for `node`.
    pub fn set_distance(&mut self, node: SceneNode, distance: f64) {
        self.distances.insert(node, distance);
    }
}

impl RenderScene for RecordingScene {
    type Camera = RecordingCamera;

    fn add_node(&mut self, node: SceneNode, position: Vec3) {
        trace!(?node, "add node");
        self.nodes.insert(node, position);
    }

    fn remove_node(&mut self, node: SceneNode) {
        trace!(?node, "remove node");
        self.nodes.remove(&node);
        if let SceneNode::Tile(coord) = node {
            self.textures.remove(&coord);
        }
    }

    fn move_node(&mut self, node: SceneNode, position: Vec3) {
        if let Some(p) = self.nodes.get_mut(&node) {
            *p = position;
        }
    }

    fn set_tile_texture(&mut self, coord: TileCoord, texture_sid: &str) {
        trace!(?coord, texture_sid, "bind tile texture");
        self.textures.insert(coord, texture_sid.to_string());
    }

    /// Without an override, screen offsets are relative to the view center
    /// and the camera looks straight down.
    fn cast_ray(&self, screen_x: f64, screen_y: f64) -> Ray {
        self.pick_ray.unwrap_or_else(|| {
            Ray::new(
                self.camera.position,
                Vec3::new(screen_x, -DEFAULT_FOCAL_PX, screen_y),
            )
        })
    }

    fn distance_from_camera(&self, node: SceneNode) -> f64 {
        if let Some(d) = self.distances.get(&node) {
            return *d;
        }
        self.nodes
            .get(&node)
            .map_or(f64::INFINITY, |p| (*p - self.camera.position).length())
    }

    fn camera(&self) -> &RecordingCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut RecordingCamera {
        &mut self.camera
    }

    fn render_step(&mut self) {
        self.frames += 1;
    }
}

#[derive(Debug)]
pub struct HeadlessMesh {
    sid: String,
}

impl Mesh for HeadlessMesh {
    fn sid(&self) -> &str {
        &self.sid
    }
}

#[derive(Debug)]
pub struct HeadlessMaterial {
    sid: String,
    diffuse: Mutex<Color>,
}

impl HeadlessMaterial {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            diffuse: Mutex::new([0.0; 3]),
        }
    }

    pub fn diffuse(&self) -> Color {
        *self.diffuse.lock()
    }
}

impl Material for HeadlessMaterial {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn set_diffuse_color(&self, color: Color) {
        *self.diffuse.lock() = color;
    }
}

/// Resource manager with a fixed catalog of ids, or any id when permissive.
///
/// Acquiring the same id twice yields the same shared handle.
#[derive(Debug, Default)]
pub struct HeadlessResources {
    permissive: bool,
    known_meshes: BTreeSet<String>,
    known_materials: BTreeSet<String>,
    meshes: HashMap<String, Arc<HeadlessMesh>>,
    materials: HashMap<String, Arc<HeadlessMaterial>>,
}

impl HeadlessResources {
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    pub fn with_mesh(mut self, sid: impl Into<String>) -> Self {
        self.known_meshes.insert(sid.into());
        self
    }

    pub fn with_material(mut self, sid: impl Into<String>) -> Self {
        self.known_materials.insert(sid.into());
        self
    }

    /// Concrete material, for inspecting its color.
    pub fn material(&self, sid: &str) -> Option<Arc<HeadlessMaterial>> {
        self.materials.get(sid).cloned()
    }
}

impl ResourceProvider for HeadlessResources {
    fn acquire_mesh(&mut self, sid: &str) -> Result<MeshHandle, ResourceError> {
        if !self.permissive && !self.known_meshes.contains(sid) {
            return Err(ResourceError::UnknownMesh(sid.to_string()));
        }
        let mesh: MeshHandle = self
            .meshes
            .entry(sid.to_string())
            .or_insert_with(|| {
                Arc::new(HeadlessMesh {
                    sid: sid.to_string(),
                })
            })
            .clone();
        Ok(mesh)
    }

    fn acquire_material(&mut self, sid: &str) -> Result<MaterialHandle, ResourceError> {
        if !self.permissive && !self.known_materials.contains(sid) {
            return Err(ResourceError::UnknownMaterial(sid.to_string()));
        }
        let material: MaterialHandle = self
            .materials
            .entry(sid.to_string())
            .or_insert_with(|| Arc::new(HeadlessMaterial::new(sid)))
            .clone();
        Ok(material)
    }
}
