//! Registry persistence as GeoJSON
//!
//! The registry lives on disk as a FeatureCollection: one Feature per
//! segment, LineString geometry, `segment_id` property. Each run follows a
//! read-modify-write cycle with no concurrent writers; the save goes through
//! a temporary file and a rename so an interrupted run leaves the previous
//! registry intact.

use crate::error::{PipelineError, Result};
use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;
use street_census_lib::{Registry, Segment};

/// Load and validate a persisted registry.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let text = fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_registry(&text)
}

/// Persist the registry, replacing the previous file only once the new one
/// is fully written.
pub fn save_registry(path: &Path, registry: &Registry) -> Result<()> {
    let temp = path.with_extension("tmp");
    fs::write(&temp, registry_to_geojson(registry)).map_err(|source| PipelineError::Write {
        path: temp.clone(),
        source,
    })?;
    fs::rename(&temp, path).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a registry FeatureCollection.
///
/// Every feature must carry a line-shaped geometry and a non-negative integer
/// `segment_id`; anything else means the persisted registry is corrupted and
/// the run must not proceed.
pub fn parse_registry(text: &str) -> Result<Registry> {
    let collection = parse_collection(text)?;
    let mut segments = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        let geometry = line_string_of(feature, index)?;
        let id = segment_id_of(feature, index)?;
        segments.push(Segment { id, geometry });
    }

    Ok(Registry::new(segments)?)
}

/// Render the registry back to GeoJSON text.
pub fn registry_to_geojson(registry: &Registry) -> String {
    let features = registry
        .segments()
        .iter()
        .map(|segment| {
            let mut properties = Map::new();
            properties.insert("segment_id".to_string(), Json::from(segment.id));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(
                    segment.geometry.0.iter().map(|c| vec![c.x, c.y]).collect(),
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
    .to_string()
}

/// Parse text into a FeatureCollection.
pub(crate) fn parse_collection(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

/// Extract a feature's geometry as a polyline.
///
/// LineStrings pass through; a Point becomes the degenerate single-coordinate
/// polyline. Other geometry types are rejected per-feature rather than
/// guessed at.
pub(crate) fn line_string_of(feature: &Feature, index: usize) -> Result<LineString<f64>> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| PipelineError::Feature {
            index,
            reason: "missing geometry".to_string(),
        })?;

    match &geometry.value {
        Value::LineString(positions) => {
            let coords = positions
                .iter()
                .map(|position| coord_of(position, index))
                .collect::<Result<Vec<Coord<f64>>>>()?;
            Ok(LineString::new(coords))
        }
        Value::Point(position) => Ok(LineString::new(vec![coord_of(position, index)?])),
        other => Err(PipelineError::Feature {
            index,
            reason: format!("geometry must be a LineString, found {}", other.type_name()),
        }),
    }
}

fn coord_of(position: &[f64], index: usize) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(PipelineError::Feature {
            index,
            reason: "position has fewer than two ordinates".to_string(),
        }),
    }
}

fn segment_id_of(feature: &Feature, index: usize) -> Result<u64> {
    feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get("segment_id"))
        .and_then(Json::as_u64)
        .ok_or_else(|| PipelineError::Feature {
            index,
            reason: "segment_id must be a non-negative integer".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_text(features: &str) -> String {
        format!(r#"{{"type":"FeatureCollection","features":[{features}]}}"#)
    }

    fn feature(id: &str, geometry: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"segment_id":{id}}},"geometry":{geometry}}}"#
        )
    }

    const LINE: &str = r#"{"type":"LineString","coordinates":[[0.0,0.0],[100.0,0.0]]}"#;

    #[test]
    fn test_parse_registry() {
        let text = registry_text(&feature("5", LINE));
        let registry = parse_registry(&text).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.segments()[0].id, 5);
        assert_eq!(registry.segments()[0].geometry.0.len(), 2);
    }

    #[test]
    fn test_round_trip_preserves_ids_and_geometry() {
        let text = registry_text(&[feature("0", LINE), feature("7", LINE)].join(","));
        let registry = parse_registry(&text).unwrap();

        let rendered = registry_to_geojson(&registry);
        let reloaded = parse_registry(&rendered).unwrap();

        assert_eq!(reloaded.len(), registry.len());
        for (a, b) in registry.segments().iter().zip(reloaded.segments()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.geometry, b.geometry);
        }
    }

    #[test]
    fn test_negative_id_is_a_load_error() {
        let text = registry_text(&feature("-3", LINE));
        assert!(matches!(
            parse_registry(&text),
            Err(PipelineError::Feature { index: 0, .. })
        ));
    }

    #[test]
    fn test_fractional_id_is_a_load_error() {
        let text = registry_text(&feature("2.5", LINE));
        assert!(matches!(
            parse_registry(&text),
            Err(PipelineError::Feature { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_segment_id_is_a_load_error() {
        let text = registry_text(
            &format!(r#"{{"type":"Feature","properties":{{}},"geometry":{LINE}}}"#),
        );
        assert!(matches!(
            parse_registry(&text),
            Err(PipelineError::Feature { index: 0, .. })
        ));
    }

    #[test]
    fn test_polygon_geometry_is_rejected() {
        let polygon =
            r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}"#;
        let text = registry_text(&feature("1", polygon));
        assert!(matches!(
            parse_registry(&text),
            Err(PipelineError::Feature { index: 0, .. })
        ));
    }

    #[test]
    fn test_point_becomes_degenerate_polyline() {
        let point = r#"{"type":"Point","coordinates":[12.0,34.0]}"#;
        let text = registry_text(&feature("0", point));
        let registry = parse_registry(&text).unwrap();
        assert_eq!(registry.segments()[0].geometry.0.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_rejected_at_load() {
        let text = registry_text(&[feature("4", LINE), feature("4", LINE)].join(","));
        assert!(matches!(
            parse_registry(&text),
            Err(PipelineError::Engine(_))
        ));
    }
}
