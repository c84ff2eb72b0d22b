use std::fmt;

use formats::FormatError;

use crate::resources::ResourceError;

#[derive(Debug)]
pub enum SceneError {
    Format(FormatError),
    Resource(ResourceError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Format(e) => write!(f, "scene data error: {e}"),
            SceneError::Resource(e) => write!(f, "scene resource error: {e}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Format(e) => Some(e),
            SceneError::Resource(e) => Some(e),
        }
    }
}

impl From<FormatError> for SceneError {
    fn from(e: FormatError) -> Self {
        SceneError::Format(e)
    }
}

impl From<ResourceError> for SceneError {
    fn from(e: ResourceError) -> Self {
        SceneError::Resource(e)
    }
}
