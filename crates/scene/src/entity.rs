use foundation::bounds::{Aabb3, Ray, ray_sphere_hit_t};
use foundation::handles::Handle;
use foundation::math::{LatLng, LatLngAlt, Vec3, local_offset, tile_index_x, tile_index_y};
use streaming::grid::TileIndex;

use crate::resources::{Color, MaterialHandle, MeshHandle, ResourceError, ResourceProvider};

/// Diffuse color of the selected point of interest.
pub const HIGHLIGHT_COLOR: Color = [0.8, 0.1, 0.3];
/// Diffuse color a point of interest returns to when deselected.
pub const BASE_COLOR: Color = [0.0, 0.0, 0.0];

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle(pub Handle);

impl EntityHandle {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// Local-space volume used for ray picking, centered on the entity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PickShape {
    Sphere { radius: f64 },
    Box { half_extents: Vec3 },
}

impl PickShape {
    /// Entry distance along the ray, if the shape centered at `center` is hit.
    pub fn ray_hit_t(&self, ray: &Ray, center: Vec3) -> Option<f64> {
        match *self {
            PickShape::Sphere { radius } => ray_sphere_hit_t(ray, center, radius),
            PickShape::Box { half_extents } => {
                Aabb3::from_center(center, half_extents).ray_hit_t(ray)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Poi {
    shape: PickShape,
    highlighted: bool,
}

impl Poi {
    pub fn shape(&self) -> PickShape {
        self.shape
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeoEntityKind {
    Static,
    Poi(Poi),
}

/// A renderable object anchored at geographic coordinates.
///
/// The local position is derived from the coordinates and the scene origin;
/// the manager keeps it current.
#[derive(Debug, Clone)]
pub struct GeoEntity {
    coords: LatLngAlt,
    local_position: Vec3,
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
    kind: GeoEntityKind,
}

/// What picking needs from a point of interest.
#[derive(Debug, Copy, Clone)]
pub struct Pickable<'a> {
    pub shape: PickShape,
    pub center: Vec3,
    pub material: &'a MaterialHandle,
}

impl Pickable<'_> {
    pub fn ray_hit_t(&self, ray: &Ray) -> Option<f64> {
        self.shape.ray_hit_t(ray, self.center)
    }
}

impl GeoEntity {
    pub fn new(coords: LatLngAlt) -> Self {
        Self {
            coords,
            local_position: Vec3::ZERO,
            mesh: None,
            material: None,
            kind: GeoEntityKind::Static,
        }
    }

    /// Entity with a mesh and material acquired by id from the render engine.
    pub fn from_resources<R: ResourceProvider + ?Sized>(
        resources: &mut R,
        mesh_sid: &str,
        material_sid: &str,
        coords: LatLngAlt,
    ) -> Result<Self, ResourceError> {
        let mesh = resources.acquire_mesh(mesh_sid)?;
        let material = resources.acquire_material(material_sid)?;
        Ok(Self::new(coords).with_mesh(mesh).with_material(material))
    }

    pub fn with_mesh(mut self, mesh: MeshHandle) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: MaterialHandle) -> Self {
        self.material = Some(material);
        self
    }

    /// Turns the entity into a pickable point of interest.
    pub fn poi(mut self, shape: PickShape) -> Self {
        self.kind = GeoEntityKind::Poi(Poi {
            shape,
            highlighted: false,
        });
        self
    }

    pub fn coords(&self) -> LatLngAlt {
        self.coords
    }

    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    pub fn mesh(&self) -> Option<&MeshHandle> {
        self.mesh.as_ref()
    }

    pub fn material(&self) -> Option<&MaterialHandle> {
        self.material.as_ref()
    }

    pub fn kind(&self) -> GeoEntityKind {
        self.kind
    }

    pub fn is_poi(&self) -> bool {
        matches!(self.kind, GeoEntityKind::Poi(_))
    }

    pub fn is_highlighted(&self) -> bool {
        matches!(self.kind, GeoEntityKind::Poi(poi) if poi.highlighted)
    }

    /// Only points of interest with a material take part in picking.
    pub fn pickable(&self) -> Option<Pickable<'_>> {
        let GeoEntityKind::Poi(poi) = self.kind else {
            return None;
        };
        let material = self.material.as_ref()?;
        Some(Pickable {
            shape: poi.shape,
            center: self.local_position,
            material,
        })
    }

    /// Tile containing the entity's coordinates at `zoom`.
    pub fn tile_index(&self, zoom: u8) -> TileIndex {
        TileIndex::new(
            tile_index_x(self.coords.lng, zoom),
            tile_index_y(self.coords.lat, zoom),
        )
    }

    /// Updates coordinates only; call [`GeoEntity::reproject`] afterwards.
    pub(crate) fn set_coords(&mut self, coords: LatLngAlt) {
        self.coords = coords;
    }

    pub(crate) fn reproject(&mut self, origin: LatLng) -> Vec3 {
        self.local_position = local_offset(origin, self.coords);
        self.local_position
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        let GeoEntityKind::Poi(poi) = &mut self.kind else {
            return;
        };
        poi.highlighted = highlighted;
        if let Some(material) = &self.material {
            material.set_diffuse_color(if highlighted { HIGHLIGHT_COLOR } else { BASE_COLOR });
        }
    }
}
