use formats::{BuildingCatalog, GeoSceneConfig};
use foundation::math::{LatLng, LatLngAlt};
use runtime::{MessagePoster, MessageQueue};
use tracing::{debug, info, trace};

use crate::error::SceneError;
use crate::manager::GeoSceneManager;
use crate::render::{RenderScene, Translation, TranslationFunction};
use crate::resources::ResourceProvider;

/// Material shared by catalog buildings.
pub const BUILDING_MATERIAL_SID: &str = "building";
/// Prefix of catalog building keys; the key doubles as the mesh id.
pub const BUILDING_KEY_PREFIX: &str = "building/";
/// Height above ground at which buildings are anchored (meters).
pub const BUILDING_ALTITUDE_M: f64 = 0.1;

/// Work deferred to the update thread.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoMessage {
    TileAvailable { x: i64, y: i64, zoom: u8 },
    PlaceCamera {
        coords: LatLngAlt,
        translation: Option<Translation>,
    },
    SetOrigin(LatLng),
    RemoveEntity(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StepReport {
    pub frame: u64,
    pub messages: usize,
    pub stale_tiles: usize,
}

/// Geo scene manager plus the message queue feeding it.
///
/// Each step drains the queue, then updates the geo scene, then lets the
/// render scene draw.
pub struct GeoEngine<S: RenderScene> {
    manager: GeoSceneManager<S>,
    queue: MessageQueue<GeoMessage>,
    frame: u64,
}

impl<S: RenderScene> GeoEngine<S> {
    pub fn new(scene: S, config: GeoSceneConfig) -> Self {
        Self {
            manager: GeoSceneManager::new(scene, config),
            queue: MessageQueue::new(),
            frame: 0,
        }
    }

    pub fn init(&mut self, start: LatLngAlt) {
        self.manager.init(start);
    }

    pub fn manager(&self) -> &GeoSceneManager<S> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut GeoSceneManager<S> {
        &mut self.manager
    }

    /// Handle for worker threads.
    pub fn poster(&self) -> MessagePoster<GeoMessage> {
        self.queue.poster()
    }

    pub fn post(&self, message: GeoMessage) {
        self.queue.post(message);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Registers every catalog building as `building/<id>`.
    ///
    /// Stops at the first building whose resources cannot be acquired;
    /// buildings registered before it stay registered.
    pub fn load_buildings<R: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut R,
        catalog: &BuildingCatalog,
    ) -> Result<usize, SceneError> {
        for building in catalog.buildings() {
            let key = format!("{BUILDING_KEY_PREFIX}{}", building.id);
            let coords = LatLngAlt::new(
                building.position.lat,
                building.position.lng,
                BUILDING_ALTITUDE_M,
            );
            let entity = self.manager.create_geo_entity(
                resources,
                &key,
                BUILDING_MATERIAL_SID,
                coords,
            )?;
            self.manager.add_geo_entity(key, entity);
        }
        info!(count = catalog.len(), "buildings loaded");
        Ok(catalog.len())
    }

    pub fn load_buildings_json<R: ResourceProvider + ?Sized>(
        &mut self,
        resources: &mut R,
        payload: &str,
    ) -> Result<usize, SceneError> {
        let catalog = BuildingCatalog::from_json(payload)?;
        self.load_buildings(resources, &catalog)
    }

    pub fn step(&mut self) -> StepReport {
        self.frame += 1;
        let mut report = StepReport {
            frame: self.frame,
            ..StepReport::default()
        };

        for message in self.queue.drain() {
            report.messages += 1;
            trace!(?message, "handling message");
            match message {
                GeoMessage::TileAvailable { x, y, zoom } => {
                    if !self.manager.notify_tile_available(x, y, zoom).is_loaded() {
                        report.stale_tiles += 1;
                    }
                }
                GeoMessage::PlaceCamera {
                    coords,
                    translation,
                } => {
                    let (duration, function) = translation.map_or(
                        (-1.0, TranslationFunction::Linear),
                        |t| (t.duration_s, t.function),
                    );
                    self.manager.place_camera(coords, duration, function);
                }
                GeoMessage::SetOrigin(origin) => self.manager.set_origin(origin.lat, origin.lng),
                GeoMessage::RemoveEntity(key) => {
                    self.manager.remove_geo_entity(&key);
                }
            }
        }

        self.manager.step();
        self.manager.scene_mut().render_step();
        report
    }

    /// Drops pending messages and detaches everything from the scene.
    pub fn unload(&mut self) {
        let dropped = self.queue.drain().len();
        if dropped > 0 {
            debug!(dropped, "discarding pending messages");
        }
        self.manager.unload();
    }
}
