use crate::tile::TileCoord;

/// Asynchronous tile source.
///
/// Calls are fire-and-forget and happen on the update thread; an
/// implementation must not block. Completion is reported back through
/// `TileGrid::notify_tile_available`, typically via a posted message.
pub trait TileProvider {
    fn on_tile_requested(&mut self, coord: TileCoord);

    /// The tile left the window. In-flight loads are not cancelled; their
    /// completion will be reported stale.
    fn on_tile_released(&mut self, _coord: TileCoord) {}
}

/// Outcome of a tile-available notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileStatus {
    /// The tile is in the window and is now resident.
    Loaded,
    /// The tile is no longer wanted (scrolled out, other zoom, torn down).
    Stale,
}

impl TileStatus {
    pub fn is_loaded(self) -> bool {
        matches!(self, TileStatus::Loaded)
    }
}
