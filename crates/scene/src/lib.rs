pub mod engine;
pub mod entity;
pub mod error;
pub mod headless;
pub mod manager;
pub mod picking;
pub mod registry;
pub mod render;
pub mod resources;
pub mod selection;

pub use engine::*;
pub use entity::*;
pub use error::*;
pub use manager::*;
pub use registry::*;
pub use render::*;
pub use resources::*;
pub use selection::*;
