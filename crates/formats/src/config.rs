use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, read_file};

/// Deepest zoom level whose tile indices stay exact in `f64` math.
pub const MAX_ZOOM_LEVEL: u8 = 30;
/// Upper bound on the tile window half-width; `(2r + 1)^2` tiles stay resident.
pub const MAX_WINDOW_RADIUS: u32 = 16;

/// Tunables of the geo scene manager.
///
/// Every field has a default so a config file only needs the values it
/// overrides (`{}` is a valid config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSceneConfig {
    /// Fixed zoom level of the streamed tile grid.
    pub zoom_level: u8,
    /// Half-width of the square tile window (Chebyshev radius).
    pub window_radius: u32,
    /// The origin is re-centered when the camera target is strictly farther
    /// than this from it (meters).
    pub origin_shift_threshold_m: f64,
    /// Duration handed to the camera for orientation changes (seconds).
    pub camera_rotation_duration_s: f64,
    /// Place the camera instantly when the new tile window does not contain
    /// the previous center, even if an animation was requested.
    pub snap_camera_on_window_jump: bool,
}

impl Default for GeoSceneConfig {
    fn default() -> Self {
        Self {
            zoom_level: 20,
            window_radius: 1,
            origin_shift_threshold_m: 8_000.0,
            camera_rotation_duration_s: 0.08,
            snap_camera_on_window_jump: false,
        }
    }
}

impl GeoSceneConfig {
    pub fn from_json(payload: &str) -> Result<Self, FormatError> {
        let config: GeoSceneConfig = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.zoom_level > MAX_ZOOM_LEVEL {
            return Err(FormatError::invalid(
                "zoom_level",
                format!("{} exceeds {MAX_ZOOM_LEVEL}", self.zoom_level),
            ));
        }
        if self.window_radius > MAX_WINDOW_RADIUS {
            return Err(FormatError::invalid(
                "window_radius",
                format!("{} exceeds {MAX_WINDOW_RADIUS}", self.window_radius),
            ));
        }
        if !self.origin_shift_threshold_m.is_finite() || self.origin_shift_threshold_m <= 0.0 {
            return Err(FormatError::invalid(
                "origin_shift_threshold_m",
                format!("must be a positive distance, got {}", self.origin_shift_threshold_m),
            ));
        }
        if !self.camera_rotation_duration_s.is_finite() || self.camera_rotation_duration_s < 0.0 {
            return Err(FormatError::invalid(
                "camera_rotation_duration_s",
                format!("must be >= 0, got {}", self.camera_rotation_duration_s),
            ));
        }
        Ok(())
    }
}
