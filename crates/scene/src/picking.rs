use foundation::bounds::Ray;
use foundation::math::precision::stable_total_cmp_f64;

use crate::entity::EntityHandle;
use crate::registry::GeoEntityRegistry;
use crate::render::{RenderScene, SceneNode};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityHandle,
    /// Distance from the camera as reported by the render scene.
    pub distance: f64,
}

/// Every pickable entity in the scene that `ray` intersects.
///
/// Only entities attached to the scene take part. Hits come back in key order.
pub fn pick_hits<S: RenderScene>(
    registry: &GeoEntityRegistry,
    scene: &S,
    ray: &Ray,
) -> Vec<PickHit> {
    registry
        .iter()
        .filter(|(_, entry)| entry.in_scene())
        .filter_map(|(handle, entry)| {
            let pickable = entry.entity().pickable()?;
            pickable.ray_hit_t(ray)?;
            Some(PickHit {
                entity: handle,
                distance: scene.distance_from_camera(SceneNode::Entity(handle)),
            })
        })
        .collect()
}

/// Closest hit to the camera.
///
/// Ordering contract:
/// - The smallest camera distance wins.
/// - Ties go to the entity with the lowest key.
pub fn pick_closest<S: RenderScene>(
    registry: &GeoEntityRegistry,
    scene: &S,
    ray: &Ray,
) -> Option<PickHit> {
    pick_hits(registry, scene, ray)
        .into_iter()
        .min_by(|a, b| stable_total_cmp_f64(a.distance, b.distance))
}

#[cfg(test)]
mod tests {
    use super::{pick_closest, pick_hits};
    use crate::entity::{GeoEntity, PickShape};
    use crate::headless::{HeadlessMaterial, RecordingScene};
    use crate::registry::GeoEntityRegistry;
    use crate::render::{RenderScene, SceneNode};
    use foundation::bounds::Ray;
    use foundation::math::{LatLng, LatLngAlt, Vec3};
    use std::sync::Arc;

    fn poi(sid: &str) -> GeoEntity {
        let mut entity = GeoEntity::new(LatLngAlt::new(10.0, 10.0, 0.0))
            .with_material(Arc::new(HeadlessMaterial::new(sid)))
            .poi(PickShape::Sphere { radius: 2.0 });
        entity.reproject(LatLng::new(10.0, 10.0));
        entity
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn ties_go_to_lowest_key() {
        let mut registry = GeoEntityRegistry::new();
        let mut scene = RecordingScene::new();
        let (b, _) = registry.insert("poi/b".into(), poi("b"), true);
        let (a, _) = registry.insert("poi/a".into(), poi("a"), true);
        scene.add_node(SceneNode::Entity(a), Vec3::ZERO);
        scene.add_node(SceneNode::Entity(b), Vec3::ZERO);
        scene.set_distance(SceneNode::Entity(a), 7.0);
        scene.set_distance(SceneNode::Entity(b), 7.0);

        let hit = pick_closest(&registry, &scene, &down_ray()).expect("hit");
        assert_eq!(hit.entity, a);

        scene.set_distance(SceneNode::Entity(b), 6.5);
        let hit = pick_closest(&registry, &scene, &down_ray()).expect("hit");
        assert_eq!(hit.entity, b);
    }

    #[test]
    fn hidden_and_static_entities_are_skipped() {
        let mut registry = GeoEntityRegistry::new();
        let scene = RecordingScene::new();
        registry.insert("poi/hidden".into(), poi("hidden"), false);
        let mut plain = GeoEntity::new(LatLngAlt::new(10.0, 10.0, 0.0))
            .with_material(Arc::new(HeadlessMaterial::new("plain")));
        plain.reproject(LatLng::new(10.0, 10.0));
        registry.insert("building/1".into(), plain, true);

        assert!(pick_hits(&registry, &scene, &down_ray()).is_empty());
        assert_eq!(pick_closest(&registry, &scene, &down_ray()), None);
    }

    #[test]
    fn misses_are_not_hits() {
        let mut registry = GeoEntityRegistry::new();
        let scene = RecordingScene::new();
        registry.insert("poi/a".into(), poi("a"), true);

        let up = Ray::new(Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(pick_hits(&registry, &scene, &up).is_empty());
        assert_eq!(pick_hits(&registry, &scene, &down_ray()).len(), 1);
    }
}
