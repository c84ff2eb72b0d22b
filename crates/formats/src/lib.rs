pub mod buildings;
pub mod config;
pub mod error;
pub mod style;

pub use buildings::*;
pub use config::*;
pub use error::*;
pub use style::*;
