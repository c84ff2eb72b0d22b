/// Tile lifecycle while it sits inside the window.
///
/// A tile is `Requested` from the moment it enters the window until the
/// provider reports its content available. Leaving the window drops the tile
/// entirely, so there is no evicted state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ResidencyState {
    #[default]
    Requested,
    Resident,
}

impl ResidencyState {
    pub fn is_resident(self) -> bool {
        matches!(self, ResidencyState::Resident)
    }
}
