//! Spherical geo helpers for local scenes.
//!
//! Distances use the spherical law of cosines on a mean-radius sphere, and
//! `local_offset` projects onto a flat tangent plane around an origin. The
//! projection error grows with distance from the origin; callers bound it by
//! re-centering the origin.

use std::f64::consts::PI;

use super::Vec3;

/// Mean Earth radius (meters).
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic position in degrees with an altitude in meters.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LatLngAlt {
    pub lat: f64,
    pub lng: f64,
    pub alt: f64,
}

impl LatLngAlt {
    pub fn new(lat: f64, lng: f64, alt: f64) -> Self {
        Self { lat, lng, alt }
    }

    pub fn lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Geographic bounding box of a map tile (degrees).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn north_west(&self) -> LatLng {
        LatLng::new(self.north, self.west)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north + self.south) * 0.5,
            (self.west + self.east) * 0.5,
        )
    }
}

fn tiles_per_axis(zoom: u8) -> f64 {
    (1u64 << zoom) as f64
}

/// Slippy-map column containing `lng` at `zoom`.
pub fn tile_index_x(lng: f64, zoom: u8) -> i64 {
    ((lng + 180.0) / 360.0 * tiles_per_axis(zoom)).floor() as i64
}

/// Slippy-map row containing `lat` at `zoom` (Web Mercator, row 0 is north).
pub fn tile_index_y(lat: f64, zoom: u8) -> i64 {
    let lat_rad = lat.to_radians();
    let merc = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    ((1.0 - merc / PI) / 2.0 * tiles_per_axis(zoom)).floor() as i64
}

/// Longitude of the western edge of column `x`.
pub fn tile_x_to_lng(x: i64, zoom: u8) -> f64 {
    x as f64 / tiles_per_axis(zoom) * 360.0 - 180.0
}

/// Latitude of the northern edge of row `y`.
pub fn tile_y_to_lat(y: i64, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y as f64 / tiles_per_axis(zoom);
    n.sinh().atan().to_degrees()
}

pub fn tile_bounds(x: i64, y: i64, zoom: u8) -> GeoBounds {
    GeoBounds {
        north: tile_y_to_lat(y, zoom),
        south: tile_y_to_lat(y + 1, zoom),
        west: tile_x_to_lng(x, zoom),
        east: tile_x_to_lng(x + 1, zoom),
    }
}

/// Initial great-circle bearing from `from` to `to`, degrees in `[0, 360)`.
pub fn bearing(from: LatLng, to: LatLng) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_lambda = (to.lng - from.lng).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Great-circle distance (meters), spherical law of cosines.
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    // sin φ1 sin φ2 + cos φ1 cos φ2 cos Δλ, rearranged so coincident points
    // yield exactly 1.
    let cos_c = (phi1 - phi2).cos() - phi1.cos() * phi2.cos() * (1.0 - d_lambda.cos());
    cos_c.clamp(-1.0, 1.0).acos() * EARTH_MEAN_RADIUS_M
}

/// Flat tangent-plane offset of `target` relative to `origin`.
///
/// `x` points east and `-z` north; `y` is the target altitude, not corrected
/// for curvature.
pub fn local_offset(origin: LatLng, target: LatLngAlt) -> Vec3 {
    let to = target.lat_lng();
    let d = distance(origin, to);
    if d == 0.0 {
        return Vec3::new(0.0, target.alt, 0.0);
    }
    let theta = (90.0 - bearing(origin, to)).to_radians();
    Vec3::new(d * theta.cos(), target.alt, -d * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::{
        LatLng, LatLngAlt, bearing, distance, local_offset, tile_bounds, tile_index_x,
        tile_index_y, tile_x_to_lng, tile_y_to_lat,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn tile_indices_match_known_values() {
        // Paris, zoom 10.
        assert_eq!(tile_index_x(2.3522, 10), 518);
        assert_eq!(tile_index_y(48.8566, 10), 352);
        assert_eq!(tile_index_x(-180.0, 3), 0);
        assert_eq!(tile_index_y(0.0, 1), 1);
    }

    #[test]
    fn tile_center_round_trips_to_its_own_index() {
        for &(x, y, z) in &[(0, 0, 0), (518, 352, 10), (530_912, 360_770, 20), (7, 2, 3)] {
            let center = tile_bounds(x, y, z).center();
            assert_eq!(tile_index_x(center.lng, z), x);
            assert_eq!(tile_index_y(center.lat, z), y);
        }
    }

    #[test]
    fn tile_edges_are_inverse_of_index() {
        assert_close(tile_x_to_lng(0, 4), -180.0, 1e-12);
        assert_close(tile_x_to_lng(16, 4), 180.0, 1e-12);
        assert_close(tile_y_to_lat(1, 1), 0.0, 1e-12);
        assert!(tile_y_to_lat(0, 0) > 85.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let o = LatLng::new(0.0, 0.0);
        assert_close(bearing(o, LatLng::new(1.0, 0.0)), 0.0, 1e-9);
        assert_close(bearing(o, LatLng::new(0.0, 1.0)), 90.0, 1e-9);
        assert_close(bearing(o, LatLng::new(-1.0, 0.0)), 180.0, 1e-9);
        assert_close(bearing(o, LatLng::new(0.0, -1.0)), 270.0, 1e-9);
    }

    #[test]
    fn distance_along_meridian() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        assert_close(distance(a, b), 111_194.93, 0.01);
        assert_eq!(distance(a, a), 0.0);
        assert_eq!(distance(b, b), 0.0);
    }

    #[test]
    fn local_offset_is_zero_at_origin_and_keeps_altitude() {
        let origin = LatLng::new(48.87, 2.30);
        let v = local_offset(origin, LatLngAlt::new(48.87, 2.30, 12.5));
        assert_close(v.x, 0.0, 1e-9);
        assert_close(v.y, 12.5, 1e-12);
        assert_close(v.z, 0.0, 1e-9);
    }

    #[test]
    fn local_offset_axes_east_and_north() {
        let origin = LatLng::new(0.0, 0.0);
        let east = local_offset(origin, LatLngAlt::new(0.0, 0.01, 0.0));
        assert!(east.x > 1_000.0);
        assert_close(east.z, 0.0, 1e-6);

        let north = local_offset(origin, LatLngAlt::new(0.01, 0.0, 0.0));
        assert!(north.z < -1_000.0);
        assert_close(north.x, 0.0, 1e-6);
        assert_close(-north.z, distance(origin, LatLng::new(0.01, 0.0)), 1e-6);
    }
}
