use std::collections::BTreeMap;

use formats::style::TileStyle;
use foundation::math::{LatLng, Vec3};
use tracing::{debug, trace};

use crate::provider::{TileProvider, TileStatus};
use crate::tile::{Tile, TileCoord};

/// Center of the tile window, in tile indices at the grid zoom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub x: i64,
    pub y: i64,
}

impl TileIndex {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// True iff tile `(x, y)` lies in the square window of half-width `radius`
/// around `(cx, cy)` (Chebyshev distance).
pub fn is_in_range(x: i64, y: i64, cx: i64, cy: i64, radius: u32) -> bool {
    let r = i64::from(radius);
    (x - cx).abs() <= r && (y - cy).abs() <= r
}

/// Tiles that entered and left the window during a recenter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileDelta {
    pub entered: Vec<TileCoord>,
    pub left: Vec<TileCoord>,
}

impl TileDelta {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }
}

/// Square window of resident tiles around a moving center.
///
/// Ordering contract:
/// - `tiles()` and both `TileDelta` lists iterate in `TileCoord` order.
pub struct TileGrid {
    zoom: u8,
    radius: u32,
    center: Option<TileIndex>,
    tiles: BTreeMap<TileCoord, Tile>,
    style: TileStyle,
    provider: Option<Box<dyn TileProvider>>,
}

impl std::fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileGrid")
            .field("zoom", &self.zoom)
            .field("radius", &self.radius)
            .field("center", &self.center)
            .field("tiles", &self.tiles.len())
            .field("namespace", &self.style.namespace)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

impl TileGrid {
    pub fn new(zoom: u8, radius: u32) -> Self {
        Self {
            zoom,
            radius,
            center: None,
            tiles: BTreeMap::new(),
            style: TileStyle::default(),
            provider: None,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn center(&self) -> Option<TileIndex> {
        self.center
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    pub fn set_provider(&mut self, provider: Option<Box<dyn TileProvider>>) {
        self.provider = provider;
    }

    pub fn apply_style(&mut self, style: TileStyle) {
        debug!(namespace = %style.namespace, "applying tile style");
        self.style = style;
    }

    pub fn style(&self) -> &TileStyle {
        &self.style
    }

    /// Texture resource id for a tile under the current style namespace.
    pub fn texture_sid(&self, coord: TileCoord) -> String {
        format!("{}/{}/{}/{}", self.style.namespace, coord.z, coord.x, coord.y)
    }

    /// Range check against this grid's radius.
    pub fn is_in_range(&self, x: i64, y: i64, cx: i64, cy: i64) -> bool {
        is_in_range(x, y, cx, cy, self.radius)
    }

    /// Range check against an optional center; no center means no window.
    pub fn window_contains(&self, x: i64, y: i64, center: Option<TileIndex>) -> bool {
        center.is_some_and(|c| self.is_in_range(x, y, c.x, c.y))
    }

    /// Moves the window to `(cx, cy)`.
    ///
    /// Tiles leaving the window are dropped and reported released; tiles
    /// entering it are created `Requested` and requested from the provider.
    /// Indices outside the world at this zoom are skipped.
    pub fn recenter(&mut self, cx: i64, cy: i64) -> TileDelta {
        let target = TileIndex::new(cx, cy);
        if self.center == Some(target) {
            return TileDelta::default();
        }
        trace!(from = ?self.center, to = ?target, "recentering tile grid");

        let left: Vec<TileCoord> = self
            .tiles
            .keys()
            .filter(|c| !self.is_in_range(c.x, c.y, cx, cy))
            .copied()
            .collect();
        for coord in &left {
            self.tiles.remove(coord);
            if let Some(provider) = self.provider.as_mut() {
                provider.on_tile_released(*coord);
            }
        }

        let r = i64::from(self.radius);
        let mut entered = Vec::new();
        for x in (cx - r)..=(cx + r) {
            for y in (cy - r)..=(cy + r) {
                let coord = TileCoord::new(self.zoom, x, y);
                if !coord.is_valid() || self.tiles.contains_key(&coord) {
                    continue;
                }
                self.tiles.insert(coord, Tile::new(coord));
                entered.push(coord);
            }
        }
        entered.sort();
        if let Some(provider) = self.provider.as_mut() {
            for coord in &entered {
                provider.on_tile_requested(*coord);
            }
        }

        debug!(
            entered = entered.len(),
            left = left.len(),
            "tile window moved to ({cx}, {cy})"
        );
        self.center = Some(target);
        TileDelta { entered, left }
    }

    /// Completion entry point for asynchronous tile loads.
    pub fn notify_tile_available(&mut self, x: i64, y: i64, zoom: u8) -> TileStatus {
        let coord = TileCoord::new(zoom, x, y);
        match self.tiles.get_mut(&coord) {
            Some(tile) => {
                tile.mark_resident();
                trace!(?coord, "tile resident");
                TileStatus::Loaded
            }
            None => {
                debug!(?coord, "ignoring stale tile completion");
                TileStatus::Stale
            }
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.mark_dirty();
        }
    }

    /// Recomputes every dirty tile against `origin`; returns the moved tiles.
    pub fn reposition_dirty(&mut self, origin: LatLng) -> Vec<(TileCoord, Vec3)> {
        self.tiles
            .values_mut()
            .filter(|tile| tile.is_dirty())
            .map(|tile| (tile.coord(), tile.reposition(origin)))
            .collect()
    }

    /// Drops every tile and forgets the center. Provider and style persist.
    pub fn clear(&mut self) -> Vec<TileCoord> {
        let dropped: Vec<TileCoord> = self.tiles.keys().copied().collect();
        self.tiles.clear();
        self.center = None;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::{TileGrid, TileIndex, is_in_range};
    use crate::provider::{TileProvider, TileStatus};
    use crate::residency::ResidencyState;
    use crate::tile::TileCoord;
    use formats::style::TileStyle;
    use foundation::math::LatLng;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        requested: Vec<TileCoord>,
        released: Vec<TileCoord>,
    }

    struct RecordingProvider(Rc<RefCell<Log>>);

    impl TileProvider for RecordingProvider {
        fn on_tile_requested(&mut self, coord: TileCoord) {
            self.0.borrow_mut().requested.push(coord);
        }

        fn on_tile_released(&mut self, coord: TileCoord) {
            self.0.borrow_mut().released.push(coord);
        }
    }

    fn grid_with_log(zoom: u8, radius: u32) -> (TileGrid, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut grid = TileGrid::new(zoom, radius);
        grid.set_provider(Some(Box::new(RecordingProvider(log.clone()))));
        (grid, log)
    }

    #[test]
    fn range_is_reflexive_and_symmetric() {
        for &(x, y) in &[(0, 0), (10, -3), (530_912, 360_770)] {
            assert!(is_in_range(x, y, x, y, 0));
            assert!(is_in_range(x, y, x, y, 1));
        }
        for &(a, b) in &[((5, 5), (6, 4)), ((5, 5), (7, 5)), ((0, 0), (-1, 1))] {
            let ((ax, ay), (bx, by)) = (a, b);
            assert_eq!(
                is_in_range(ax, ay, bx, by, 1),
                is_in_range(bx, by, ax, ay, 1)
            );
        }
        assert!(is_in_range(6, 4, 5, 5, 1));
        assert!(!is_in_range(7, 5, 5, 5, 1));
    }

    #[test]
    fn no_center_contains_nothing() {
        let grid = TileGrid::new(20, 1);
        assert!(!grid.window_contains(0, 0, grid.center()));
        assert!(grid.window_contains(0, 0, Some(TileIndex::new(1, 1))));
    }

    #[test]
    fn first_recenter_requests_full_window() {
        let (mut grid, log) = grid_with_log(10, 1);
        let delta = grid.recenter(100, 200);

        assert_eq!(delta.entered.len(), 9);
        assert!(delta.left.is_empty());
        assert_eq!(grid.len(), 9);
        assert_eq!(log.borrow().requested, delta.entered);
        assert_eq!(grid.center(), Some(TileIndex::new(100, 200)));
        assert!(grid.tiles().all(|t| t.residency() == ResidencyState::Requested));
    }

    #[test]
    fn recenter_to_same_center_is_noop() {
        let (mut grid, log) = grid_with_log(10, 1);
        grid.recenter(100, 200);
        let delta = grid.recenter(100, 200);
        assert!(delta.is_empty());
        assert_eq!(log.borrow().requested.len(), 9);
    }

    #[test]
    fn shifting_one_column_swaps_three_tiles() {
        let (mut grid, log) = grid_with_log(10, 1);
        grid.recenter(100, 200);
        let delta = grid.recenter(101, 200);

        assert_eq!(
            delta.left,
            vec![
                TileCoord::new(10, 99, 199),
                TileCoord::new(10, 99, 200),
                TileCoord::new(10, 99, 201),
            ]
        );
        assert_eq!(
            delta.entered,
            vec![
                TileCoord::new(10, 102, 199),
                TileCoord::new(10, 102, 200),
                TileCoord::new(10, 102, 201),
            ]
        );
        assert_eq!(grid.len(), 9);
        assert_eq!(log.borrow().released, delta.left);
    }

    #[test]
    fn world_edge_skips_invalid_indices() {
        let mut grid = TileGrid::new(2, 1);
        let delta = grid.recenter(0, 0);
        assert_eq!(
            delta.entered,
            vec![
                TileCoord::new(2, 0, 0),
                TileCoord::new(2, 0, 1),
                TileCoord::new(2, 1, 0),
                TileCoord::new(2, 1, 1),
            ]
        );
    }

    #[test]
    fn notify_marks_resident_and_dirty() {
        let mut grid = TileGrid::new(10, 1);
        grid.recenter(100, 200);
        grid.reposition_dirty(LatLng::new(0.0, 0.0));
        assert!(grid.tiles().all(|t| !t.is_dirty()));

        assert_eq!(grid.notify_tile_available(100, 200, 10), TileStatus::Loaded);
        let tile = grid.tile(TileCoord::new(10, 100, 200)).unwrap();
        assert_eq!(tile.residency(), ResidencyState::Resident);
        assert!(tile.is_dirty());
    }

    #[test]
    fn stale_notifications_are_benign() {
        let mut grid = TileGrid::new(10, 1);
        grid.recenter(100, 200);
        grid.recenter(110, 200);

        assert_eq!(grid.notify_tile_available(100, 200, 10), TileStatus::Stale);
        assert_eq!(grid.notify_tile_available(110, 200, 11), TileStatus::Stale);
        assert_eq!(grid.len(), 9);
        assert!(grid.tile(TileCoord::new(10, 100, 200)).is_none());
    }

    #[test]
    fn reposition_dirty_only_touches_dirty_tiles() {
        let mut grid = TileGrid::new(10, 1);
        grid.recenter(100, 200);
        let origin = LatLng::new(40.0, -100.0);
        assert_eq!(grid.reposition_dirty(origin).len(), 9);
        assert!(grid.reposition_dirty(origin).is_empty());

        grid.notify_tile_available(101, 201, 10);
        let moved = grid.reposition_dirty(origin);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].0, TileCoord::new(10, 101, 201));

        grid.mark_all_dirty();
        let moved = grid.reposition_dirty(origin);
        assert_eq!(moved.len(), 9);
        for (coord, pos) in moved {
            assert_eq!(pos, grid.tile(coord).unwrap().local_position(origin));
        }
    }

    #[test]
    fn texture_sid_uses_style_namespace() {
        let mut grid = TileGrid::new(10, 1);
        let coord = TileCoord::new(10, 3, 4);
        assert_eq!(grid.texture_sid(coord), "tiles/10/3/4");
        grid.apply_style(TileStyle::from_json(r#"{"namespace": "satellite"}"#).unwrap());
        assert_eq!(grid.texture_sid(coord), "satellite/10/3/4");
    }

    #[test]
    fn clear_drops_tiles_and_center() {
        let mut grid = TileGrid::new(10, 1);
        grid.recenter(100, 200);
        assert_eq!(grid.clear().len(), 9);
        assert!(grid.is_empty());
        assert_eq!(grid.center(), None);
    }
}
