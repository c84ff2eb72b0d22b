pub mod grid;
pub mod provider;
pub mod residency;
pub mod tile;

pub use grid::*;
pub use provider::*;
pub use residency::*;
pub use tile::*;
