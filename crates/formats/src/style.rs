use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FormatError, read_file};

pub const DEFAULT_TILE_NAMESPACE: &str = "tiles";

/// Rendering style applied to the tile grid.
///
/// Only `namespace` is interpreted here (it prefixes tile texture ids); all
/// other keys are carried through untouched for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileStyle {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

fn default_namespace() -> String {
    DEFAULT_TILE_NAMESPACE.to_string()
}

impl Default for TileStyle {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            properties: Map::new(),
        }
    }
}

impl TileStyle {
    pub fn from_json(payload: &str) -> Result<Self, FormatError> {
        let style: TileStyle = serde_json::from_str(payload)?;
        if style.namespace.is_empty() || style.namespace.contains(char::is_whitespace) {
            return Err(FormatError::invalid(
                "namespace",
                format!("{:?} is not a usable texture namespace", style.namespace),
            ));
        }
        Ok(style)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TILE_NAMESPACE, TileStyle};
    use crate::error::FormatError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unknown_keys_pass_through() {
        let style = TileStyle::from_json(
            r#"{"namespace": "osm", "background": [0.1, 0.2, 0.3], "roads": {"width": 2}}"#,
        )
        .expect("parse");
        assert_eq!(style.namespace, "osm");
        assert_eq!(style.property("background"), Some(&json!([0.1, 0.2, 0.3])));
        assert_eq!(style.property("roads"), Some(&json!({"width": 2})));
        assert_eq!(style.properties.len(), 2);
    }

    #[test]
    fn namespace_defaults_when_missing() {
        let style = TileStyle::from_json("{}").expect("parse");
        assert_eq!(style, TileStyle::default());
        assert_eq!(style.namespace, DEFAULT_TILE_NAMESPACE);
    }

    #[test]
    fn unusable_namespace_is_rejected() {
        let err = TileStyle::from_json(r#"{"namespace": ""}"#).expect_err("empty");
        assert!(matches!(err, FormatError::Invalid { field: "namespace", .. }));
        let err = TileStyle::from_json(r#"{"namespace": "a b"}"#).expect_err("space");
        assert!(matches!(err, FormatError::Invalid { .. }));
    }

    #[test]
    fn non_object_is_a_parse_error() {
        let err = TileStyle::from_json("[1, 2]").expect_err("array");
        assert!(matches!(err, FormatError::Parse(_)));
    }
}
