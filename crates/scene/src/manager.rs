use formats::{GeoSceneConfig, TileStyle};
use foundation::math::{
    LatLng, LatLngAlt, Vec3, distance, local_offset, tile_index_x, tile_index_y,
};
use streaming::grid::{TileGrid, TileIndex};
use streaming::provider::{TileProvider, TileStatus};
use streaming::tile::TileCoord;
use tracing::{debug, info, trace, warn};

use crate::entity::{EntityHandle, GeoEntity};
use crate::picking::pick_closest;
use crate::registry::{GeoEntityRegistry, RegisteredEntity};
use crate::render::{Camera, RenderScene, Rotation, SceneNode, Translation, TranslationFunction};
use crate::resources::{ResourceError, ResourceProvider};
use crate::selection::SelectionListener;

/// Keeps a render scene consistent with a geographic world.
///
/// Local coordinates are meters relative to a movable origin (`x` east, `y`
/// up, `z` south). The manager owns the tile window around the camera, the
/// entity registry and the single point-of-interest selection. It must be
/// driven from one thread; asynchronous producers go through
/// [`crate::GeoEngine`]'s message queue.
pub struct GeoSceneManager<S: RenderScene> {
    config: GeoSceneConfig,
    scene: S,
    origin: LatLng,
    grid: TileGrid,
    registry: GeoEntityRegistry,
    camera_coords: Option<LatLngAlt>,
    selected: Option<EntityHandle>,
    listener: Option<Box<dyn SelectionListener>>,
}

impl<S: RenderScene> GeoSceneManager<S> {
    pub fn new(scene: S, config: GeoSceneConfig) -> Self {
        debug!(
            zoom = config.zoom_level,
            radius = config.window_radius,
            "geo scene manager created"
        );
        let grid = TileGrid::new(config.zoom_level, config.window_radius);
        Self {
            config,
            scene,
            origin: LatLng::default(),
            grid,
            registry: GeoEntityRegistry::new(),
            camera_coords: None,
            selected: None,
            listener: None,
        }
    }

    /// Starts a scene at `start`: the origin moves onto it and the first
    /// tile window is built around it.
    pub fn init(&mut self, start: LatLngAlt) {
        info!(lat = start.lat, lng = start.lng, "initialising geo scene");
        self.set_origin(start.lat, start.lng);
        self.place_camera(start, -1.0, TranslationFunction::Linear);
    }

    pub fn config(&self) -> &GeoSceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn origin(&self) -> LatLng {
        self.origin
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn registry(&self) -> &GeoEntityRegistry {
        &self.registry
    }

    /// Coordinates of the last camera placement.
    pub fn camera_coords(&self) -> Option<LatLngAlt> {
        self.camera_coords
    }

    /// Center of the tile window; `None` until the camera is first placed.
    pub fn window_center(&self) -> Option<TileIndex> {
        self.grid.center()
    }

    pub fn set_tile_provider(&mut self, provider: Option<Box<dyn TileProvider>>) {
        self.grid.set_provider(provider);
    }

    pub fn set_selection_listener(&mut self, listener: Option<Box<dyn SelectionListener>>) {
        self.listener = listener;
    }

    /// Texture ids of tiles are resolved under the style's namespace.
    /// Resident tiles are re-textured right away.
    pub fn apply_style(&mut self, style: TileStyle) {
        self.grid.apply_style(style);
        let resident: Vec<TileCoord> = self
            .grid
            .tiles()
            .filter(|t| t.residency().is_resident())
            .map(|t| t.coord())
            .collect();
        for coord in resident {
            self.bind_tile_texture(coord);
        }
    }

    /// Local position of a geographic point relative to the current origin.
    pub fn map_position(&self, lat: f64, lng: f64, alt: f64) -> Vec3 {
        self.map_coords(LatLngAlt::new(lat, lng, alt))
    }

    pub fn map_coords(&self, coords: LatLngAlt) -> Vec3 {
        local_offset(self.origin, coords)
    }

    /// Moves the scene origin and reprojects everything anchored to it.
    ///
    /// Entities move immediately; tiles are flagged and move on the next
    /// [`GeoSceneManager::step`].
    pub fn set_origin(&mut self, lat: f64, lng: f64) {
        let origin = LatLng::new(lat, lng);
        debug!(from = ?self.origin, to = ?origin, "moving scene origin");
        self.origin = origin;
        for (handle, entry) in self.registry.iter_mut() {
            let position = entry.entity_mut().reproject(origin);
            if entry.in_scene() {
                self.scene.move_node(SceneNode::Entity(handle), position);
            }
        }
        self.grid.mark_all_dirty();
    }

    /// Per-frame update: moves tiles whose position is stale.
    pub fn step(&mut self) {
        for (coord, position) in self.grid.reposition_dirty(self.origin) {
            self.scene.move_node(SceneNode::Tile(coord), position);
        }
    }

    /// Places the camera over `coords`.
    ///
    /// When the camera lands in a new tile the origin may be shifted onto it,
    /// the tile window is moved, and entities entering or leaving the window
    /// are attached to or detached from the scene. A negative duration places
    /// the camera without animation.
    pub fn place_camera(
        &mut self,
        coords: LatLngAlt,
        translation_duration_s: f64,
        function: TranslationFunction,
    ) {
        let center = self.tile_index_of(coords);
        let previous = self.grid.center();

        if previous != Some(center) {
            let drift = distance(coords.lat_lng(), self.origin);
            if drift > self.config.origin_shift_threshold_m {
                debug!(drift_m = drift, "camera drifted past threshold");
                self.set_origin(coords.lat, coords.lng);
                // Keep the camera visually in place until the new move starts.
                if let Some(last) = self.camera_coords {
                    let position = self.map_coords(last);
                    self.scene.camera_mut().set_position(position, None);
                }
            }
            self.move_tile_window(center);
            self.update_entity_visibility(center);
        }

        let mut translation = Translation::from_duration(translation_duration_s, function);
        if self.config.snap_camera_on_window_jump
            && !self.grid.window_contains(center.x, center.y, previous)
        {
            translation = None;
        }
        let position = self.map_coords(coords);
        trace!(?coords, ?position, "placing camera");
        self.scene.camera_mut().set_position(position, translation);
        self.camera_coords = Some(coords);
    }

    /// Instant placement that keeps the camera's current height.
    pub fn place_camera_at(&mut self, target: LatLng) {
        let alt = self.scene.camera().position().y;
        self.place_camera(
            LatLngAlt::new(target.lat, target.lng, alt),
            -1.0,
            TranslationFunction::Linear,
        );
    }

    pub fn orientate_camera(&mut self, rotation: Rotation) {
        let duration = self.config.camera_rotation_duration_s;
        self.scene.camera_mut().set_orientation(rotation, duration);
    }

    /// Registers `entity` under `key`, replacing any entity with that key.
    ///
    /// Entities outside the tile window stay registered but hidden until the
    /// window reaches them.
    pub fn add_geo_entity(
        &mut self,
        key: impl Into<String>,
        mut entity: GeoEntity,
    ) -> EntityHandle {
        let position = entity.reproject(self.origin);
        let index = entity.tile_index(self.grid.zoom());
        let visible = self.grid.window_contains(index.x, index.y, self.grid.center());
        let (handle, replaced) = self.registry.insert(key.into(), entity, visible);

        if let Some((old_handle, mut old)) = replaced {
            warn!(sid = old.key(), "geo entity already registered, replacing it");
            if old.in_scene() {
                self.scene.remove_node(SceneNode::Entity(old_handle));
            }
            self.release_selection(old_handle, &mut old);
        }

        if visible {
            self.scene.add_node(SceneNode::Entity(handle), position);
        } else {
            trace!(?index, "geo entity outside the tile window, hidden");
        }
        handle
    }

    /// Entity built from render-engine resources, already projected against
    /// the current origin.
    pub fn create_geo_entity<R: ResourceProvider + ?Sized>(
        &self,
        resources: &mut R,
        mesh_sid: &str,
        material_sid: &str,
        coords: LatLngAlt,
    ) -> Result<GeoEntity, ResourceError> {
        let mut entity = GeoEntity::from_resources(resources, mesh_sid, material_sid, coords)?;
        entity.reproject(self.origin);
        Ok(entity)
    }

    pub fn remove_geo_entity(&mut self, key: &str) -> Option<GeoEntity> {
        let Some((handle, mut entry)) = self.registry.remove(key) else {
            warn!(sid = key, "cannot remove unknown geo entity");
            return None;
        };
        if entry.in_scene() {
            self.scene.remove_node(SceneNode::Entity(handle));
        }
        self.release_selection(handle, &mut entry);
        Some(entry.into_entity())
    }

    pub fn get_geo_entity(&self, key: &str) -> Option<&GeoEntity> {
        let entity = self.registry.get(key).map(RegisteredEntity::entity);
        if entity.is_none() {
            warn!(sid = key, "unknown geo entity");
        }
        entity
    }

    pub fn has_geo_entity(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    pub fn geo_entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Moves a registered entity, attaching or detaching it as its tile
    /// enters or leaves the window. Returns `false` for unknown keys.
    pub fn set_geo_entity_coords(&mut self, key: &str, coords: LatLngAlt) -> bool {
        let index = self.tile_index_of(coords);
        let visible = self.grid.window_contains(index.x, index.y, self.grid.center());
        let origin = self.origin;
        let Some(handle) = self.registry.handle(key) else {
            warn!(sid = key, "cannot move unknown geo entity");
            return false;
        };
        let Some(entry) = self.registry.resolve_mut(handle) else {
            return false;
        };

        entry.entity_mut().set_coords(coords);
        let position = entry.entity_mut().reproject(origin);
        let node = SceneNode::Entity(handle);
        match (entry.in_scene(), visible) {
            (true, true) => self.scene.move_node(node, position),
            (true, false) => self.scene.remove_node(node),
            (false, true) => self.scene.add_node(node, position),
            (false, false) => {}
        }
        entry.set_in_scene(visible);
        if !visible && self.selected == Some(handle) {
            self.deselect();
        }
        true
    }

    /// Completion entry point for tile loads. The tile gets its texture now
    /// and moves into place on the next step.
    pub fn notify_tile_available(&mut self, x: i64, y: i64, zoom: u8) -> TileStatus {
        let status = self.grid.notify_tile_available(x, y, zoom);
        if status.is_loaded() {
            self.bind_tile_texture(TileCoord::new(zoom, x, y));
        }
        status
    }

    pub fn selected(&self) -> Option<&RegisteredEntity> {
        self.selected.and_then(|h| self.registry.resolve(h))
    }

    /// Selects the point of interest under a screen position.
    ///
    /// The closest hit to the camera wins. Selection listeners only hear
    /// about changes: picking the selected entity again is silent, and
    /// picking nothing clears the selection.
    pub fn pick(&mut self, screen_x: f64, screen_y: f64) -> Option<&RegisteredEntity> {
        let ray = self.scene.cast_ray(screen_x, screen_y);
        let hit = pick_closest(&self.registry, &self.scene, &ray).map(|h| h.entity);

        if hit != self.selected {
            self.deselect();
            if let Some(handle) = hit
                && let Some(entry) = self.registry.resolve_mut(handle)
            {
                entry.entity_mut().set_highlighted(true);
                self.selected = Some(handle);
                trace!(sid = entry.key(), "poi selected");
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_poi_selected(entry.key());
                }
            }
        }

        self.selected()
    }

    /// Detaches everything from the scene and resets the manager.
    ///
    /// The tile provider, style and selection listener are kept.
    pub fn unload(&mut self) {
        for coord in self.grid.clear() {
            self.scene.remove_node(SceneNode::Tile(coord));
        }
        // Shared materials outlive the registry.
        self.deselect();
        for (handle, entry) in self.registry.drain() {
            if entry.in_scene() {
                self.scene.remove_node(SceneNode::Entity(handle));
            }
        }
        self.camera_coords = None;
        self.origin = LatLng::default();
        info!("geo scene unloaded");
    }

    fn tile_index_of(&self, coords: LatLngAlt) -> TileIndex {
        let zoom = self.grid.zoom();
        TileIndex::new(tile_index_x(coords.lng, zoom), tile_index_y(coords.lat, zoom))
    }

    fn move_tile_window(&mut self, center: TileIndex) {
        let delta = self.grid.recenter(center.x, center.y);
        for coord in &delta.left {
            self.scene.remove_node(SceneNode::Tile(*coord));
        }
        // Entering tiles are dirty, so this also covers tiles flagged by an
        // origin shift in the same placement.
        for (coord, position) in self.grid.reposition_dirty(self.origin) {
            let node = SceneNode::Tile(coord);
            if delta.entered.binary_search(&coord).is_ok() {
                self.scene.add_node(node, position);
            } else {
                self.scene.move_node(node, position);
            }
        }
    }

    /// Two passes: classify against the new window, then touch the scene.
    fn update_entity_visibility(&mut self, center: TileIndex) {
        let zoom = self.grid.zoom();
        let mut leaving = Vec::new();
        let mut entering = Vec::new();
        for (handle, entry) in self.registry.iter() {
            let index = entry.entity().tile_index(zoom);
            let inside = self.grid.is_in_range(index.x, index.y, center.x, center.y);
            match (entry.in_scene(), inside) {
                (true, false) => leaving.push(handle),
                (false, true) => entering.push(handle),
                _ => {}
            }
        }

        for &handle in &leaving {
            if self.selected == Some(handle) {
                self.deselect();
            }
            if let Some(entry) = self.registry.resolve_mut(handle) {
                entry.set_in_scene(false);
                self.scene.remove_node(SceneNode::Entity(handle));
            }
        }
        for &handle in &entering {
            if let Some(entry) = self.registry.resolve_mut(handle) {
                entry.set_in_scene(true);
                self.scene
                    .add_node(SceneNode::Entity(handle), entry.entity().local_position());
            }
        }
        if !leaving.is_empty() || !entering.is_empty() {
            debug!(
                entered = entering.len(),
                left = leaving.len(),
                "geo entity visibility updated"
            );
        }
    }

    fn bind_tile_texture(&mut self, coord: TileCoord) {
        let sid = self.grid.texture_sid(coord);
        self.scene.set_tile_texture(coord, &sid);
    }

    /// Drops the current selection, resetting its highlight.
    fn deselect(&mut self) {
        if let Some(previous) = self.selected.take()
            && let Some(entry) = self.registry.resolve_mut(previous)
        {
            entry.entity_mut().set_highlighted(false);
            trace!(sid = entry.key(), "poi deselected");
            if let Some(listener) = self.listener.as_mut() {
                listener.on_poi_deselected(entry.key());
            }
        }
    }

    /// Clears the selection if it points at `handle`, which is leaving the registry.
    fn release_selection(&mut self, handle: EntityHandle, entry: &mut RegisteredEntity) {
        if self.selected != Some(handle) {
            return;
        }
        self.selected = None;
        entry.entity_mut().set_highlighted(false);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_poi_deselected(entry.key());
        }
    }
}
