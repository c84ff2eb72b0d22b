use std::collections::BTreeMap;

use foundation::arena::Arena;

use crate::entity::{EntityHandle, GeoEntity};

/// A registered entity and whether it is currently attached to the render scene.
#[derive(Debug, Clone)]
pub struct RegisteredEntity {
    key: String,
    entity: GeoEntity,
    in_scene: bool,
}

impl RegisteredEntity {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entity(&self) -> &GeoEntity {
        &self.entity
    }

    pub fn in_scene(&self) -> bool {
        self.in_scene
    }

    pub(crate) fn entity_mut(&mut self) -> &mut GeoEntity {
        &mut self.entity
    }

    pub(crate) fn set_in_scene(&mut self, in_scene: bool) {
        self.in_scene = in_scene;
    }

    pub fn into_entity(self) -> GeoEntity {
        self.entity
    }
}

/// Keyed storage for geo entities.
///
/// Entities live in a generational arena so the render scene can hold plain
/// handles; a removed entity's handle stops resolving immediately.
///
/// Ordering contract:
/// - `iter` yields entities in ascending key order.
#[derive(Debug, Default)]
pub struct GeoEntityRegistry {
    arena: Arena<RegisteredEntity>,
    keys: BTreeMap<String, EntityHandle>,
}

impl GeoEntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn handle(&self, key: &str) -> Option<EntityHandle> {
        self.keys.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&RegisteredEntity> {
        self.handle(key).and_then(|h| self.resolve(h))
    }

    pub fn resolve(&self, handle: EntityHandle) -> Option<&RegisteredEntity> {
        self.arena.get(handle.0)
    }

    pub(crate) fn resolve_mut(&mut self, handle: EntityHandle) -> Option<&mut RegisteredEntity> {
        self.arena.get_mut(handle.0)
    }

    /// Registers `entity` under `key`, returning any entry it replaced.
    pub fn insert(
        &mut self,
        key: String,
        entity: GeoEntity,
        in_scene: bool,
    ) -> (EntityHandle, Option<(EntityHandle, RegisteredEntity)>) {
        let replaced = self.remove(&key);
        let handle = EntityHandle(self.arena.insert(RegisteredEntity {
            key: key.clone(),
            entity,
            in_scene,
        }));
        self.keys.insert(key, handle);
        (handle, replaced)
    }

    pub fn remove(&mut self, key: &str) -> Option<(EntityHandle, RegisteredEntity)> {
        let handle = self.keys.remove(key)?;
        let entry = self.arena.remove(handle.0)?;
        Some((handle, entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &RegisteredEntity)> + '_ {
        self.keys
            .values()
            .filter_map(|&h| self.arena.get(h.0).map(|e| (h, e)))
    }

    /// Arena-order mutable iteration, for passes where order is irrelevant.
    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (EntityHandle, &mut RegisteredEntity)> + '_ {
        self.arena.iter_mut().map(|(h, e)| (EntityHandle(h), e))
    }

    /// Removes every entry, returned in key order.
    pub fn drain(&mut self) -> Vec<(EntityHandle, RegisteredEntity)> {
        let keys = std::mem::take(&mut self.keys);
        keys.into_values()
            .filter_map(|h| self.arena.remove(h.0).map(|e| (h, e)))
            .collect()
    }
}
