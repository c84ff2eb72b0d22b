use std::collections::BTreeMap;
use std::path::Path;

use foundation::math::LatLng;
use serde::Deserialize;

use crate::error::{FormatError, read_file};

#[derive(Debug, Clone, Copy, Deserialize)]
struct BuildingRecord {
    lat: f64,
    lng: f64,
}

/// One footprint anchor from a building catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: String,
    pub position: LatLng,
}

/// Building catalog: a JSON object mapping building ids to `{lat, lng}`.
///
/// Ordering contract:
/// - `buildings()` is sorted by id, independent of the file's key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildingCatalog {
    buildings: Vec<Building>,
}

impl BuildingCatalog {
    pub fn from_json(payload: &str) -> Result<Self, FormatError> {
        let records: BTreeMap<String, BuildingRecord> = serde_json::from_str(payload)?;
        let mut buildings = Vec::with_capacity(records.len());
        for (id, record) in records {
            if !(-90.0..=90.0).contains(&record.lat) || !(-180.0..=180.0).contains(&record.lng) {
                return Err(FormatError::invalid(
                    "building",
                    format!("{id} has out-of-range coordinates ({}, {})", record.lat, record.lng),
                ));
            }
            buildings.push(Building {
                id,
                position: LatLng::new(record.lat, record.lng),
            });
        }
        Ok(Self { buildings })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::BuildingCatalog;
    use crate::error::FormatError;
    use foundation::math::LatLng;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_and_sorts_by_id() {
        let catalog = BuildingCatalog::from_json(
            r#"{"b2": {"lat": 48.8709, "lng": 2.3037}, "a1": {"lat": 48.8705, "lng": 2.3052}}"#,
        )
        .expect("parse");
        let ids: Vec<&str> = catalog.buildings().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
        assert_eq!(catalog.buildings()[0].position, LatLng::new(48.8705, 2.3052));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let err = BuildingCatalog::from_json(r#"{"a": {"lat": 1.0}}"#).expect_err("lng missing");
        assert!(matches!(err, FormatError::Parse(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err =
            BuildingCatalog::from_json(r#"{"a": {"lat": 91.0, "lng": 0.0}}"#).expect_err("lat");
        assert!(matches!(err, FormatError::Invalid { field: "building", .. }));
    }

    #[test]
    fn empty_catalog_is_valid() {
        let catalog = BuildingCatalog::from_json("{}").expect("parse");
        assert!(catalog.is_empty());
    }
}
