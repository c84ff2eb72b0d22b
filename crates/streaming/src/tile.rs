use foundation::math::{GeoBounds, LatLng, LatLngAlt, Vec3, distance, local_offset, tile_bounds};
use serde::{Deserialize, Serialize};

use crate::residency::ResidencyState;

/// Tile coordinate in ZXY scheme.
///
/// Ordering is `(z, x, y)`, which keeps tile iteration deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub z: u8,
    pub x: i64,
    pub y: i64,
}

impl TileCoord {
    pub fn new(z: u8, x: i64, y: i64) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn tiles_per_axis(z: u8) -> i64 {
        1i64 << z
    }

    /// Whether the indices address a tile that exists at this zoom level.
    pub fn is_valid(&self) -> bool {
        let n = Self::tiles_per_axis(self.z);
        (0..n).contains(&self.x) && (0..n).contains(&self.y)
    }

    pub fn bounds(&self) -> GeoBounds {
        tile_bounds(self.x, self.y, self.z)
    }
}

/// A geo-anchored map patch inside the tile window.
///
/// The tile is anchored at its north-west corner; its local position is the
/// quad center, which must be recomputed whenever the scene origin moves.
#[derive(Debug, Clone)]
pub struct Tile {
    coord: TileCoord,
    bounds: GeoBounds,
    width_m: f64,
    height_m: f64,
    residency: ResidencyState,
    dirty: bool,
    position: Vec3,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        let bounds = coord.bounds();
        let nw = bounds.north_west();
        let width_m = distance(nw, LatLng::new(bounds.north, bounds.east));
        let height_m = distance(nw, LatLng::new(bounds.south, bounds.west));
        Self {
            coord,
            bounds,
            width_m,
            height_m,
            residency: ResidencyState::Requested,
            dirty: true,
            position: Vec3::ZERO,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    /// Quad size in meters: `(east-west, north-south)`.
    pub fn size_m(&self) -> (f64, f64) {
        (self.width_m, self.height_m)
    }

    pub fn residency(&self) -> ResidencyState {
        self.residency
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_resident(&mut self) {
        self.residency = ResidencyState::Resident;
        self.dirty = true;
    }

    /// Quad center relative to `origin`, on the ground plane.
    pub fn local_position(&self, origin: LatLng) -> Vec3 {
        let nw = self.bounds.north_west();
        let corner = local_offset(origin, LatLngAlt::new(nw.lat, nw.lng, 0.0));
        corner + Vec3::new(self.width_m / 2.0, 0.0, self.height_m / 2.0)
    }

    /// Recomputes the local position and clears the dirty flag.
    pub fn reposition(&mut self, origin: LatLng) -> Vec3 {
        self.position = self.local_position(origin);
        self.dirty = false;
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::{Tile, TileCoord};
    use crate::residency::ResidencyState;
    use foundation::math::{LatLng, tile_index_x, tile_index_y};

    #[test]
    fn validity_bounds() {
        assert!(TileCoord::new(0, 0, 0).is_valid());
        assert!(!TileCoord::new(0, 1, 0).is_valid());
        assert!(!TileCoord::new(3, -1, 2).is_valid());
        assert!(TileCoord::new(3, 7, 7).is_valid());
    }

    #[test]
    fn new_tile_is_requested_and_dirty() {
        let tile = Tile::new(TileCoord::new(20, 530_912, 360_770));
        assert_eq!(tile.residency(), ResidencyState::Requested);
        assert!(tile.is_dirty());
        let (w, h) = tile.size_m();
        assert!(w > 10.0 && w < 40.0, "zoom 20 tile width {w}");
        assert!(h > 10.0 && h < 40.0, "zoom 20 tile height {h}");
    }

    #[test]
    fn bounds_center_maps_back_to_coord() {
        let coord = TileCoord::new(20, 530_912, 360_770);
        let center = coord.bounds().center();
        assert_eq!(tile_index_x(center.lng, coord.z), coord.x);
        assert_eq!(tile_index_y(center.lat, coord.z), coord.y);
    }

    #[test]
    fn reposition_centers_quad_and_clears_dirty() {
        let coord = TileCoord::new(20, 530_912, 360_770);
        let mut tile = Tile::new(coord);
        let origin = coord.bounds().north_west();
        let pos = tile.reposition(origin);
        let (w, h) = tile.size_m();

        assert!(!tile.is_dirty());
        assert_eq!(pos, tile.position());
        assert!((pos.x - w / 2.0).abs() < 1e-6);
        assert!((pos.z - h / 2.0).abs() < 1e-6);
        assert_eq!(pos.y, 0.0);

        tile.mark_dirty();
        assert!(tile.is_dirty());
        let shifted = tile.reposition(LatLng::new(origin.lat, origin.lng - 0.001));
        assert!(shifted.x > pos.x);
    }
}
