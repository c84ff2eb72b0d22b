use std::fmt;
use std::sync::Arc;

/// Linear RGB.
pub type Color = [f32; 3];

/// GPU mesh owned by the rendering engine; only its id is visible here.
pub trait Mesh: fmt::Debug + Send + Sync {
    fn sid(&self) -> &str;
}

/// Shared material. Implementations use interior mutability since the same
/// material may back several entities.
pub trait Material: fmt::Debug + Send + Sync {
    fn sid(&self) -> &str;
    fn set_diffuse_color(&self, color: Color);
}

pub type MeshHandle = Arc<dyn Mesh>;
pub type MaterialHandle = Arc<dyn Material>;

/// Resource manager of the rendering engine, keyed by string id.
pub trait ResourceProvider {
    fn acquire_mesh(&mut self, sid: &str) -> Result<MeshHandle, ResourceError>;
    fn acquire_material(&mut self, sid: &str) -> Result<MaterialHandle, ResourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    UnknownMesh(String),
    UnknownMaterial(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::UnknownMesh(sid) => write!(f, "unknown mesh: {sid}"),
            ResourceError::UnknownMaterial(sid) => write!(f, "unknown material: {sid}"),
        }
    }
}

impl std::error::Error for ResourceError {}
