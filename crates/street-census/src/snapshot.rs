//! Daily observation snapshot loading
//!
//! A snapshot is a GeoJSON FeatureCollection of freshly observed street
//! geometries with opaque attributes. The attributes are carried through
//! untouched except for the visited-time columns, which the source emits as
//! epoch milliseconds and which are normalized to RFC 3339 for export.

use crate::error::{PipelineError, Result};
use crate::store::{line_string_of, parse_collection};
use chrono::DateTime;
use geo::LineString;
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;

/// One observed record: geometry plus pass-through properties.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub geometry: LineString<f64>,
    pub properties: Map<String, Json>,
}

/// Load a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Vec<SnapshotRecord>> {
    let text = fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(&text)
}

/// Parse snapshot text into records, rejecting non-line geometries per-record.
pub fn parse_snapshot(text: &str) -> Result<Vec<SnapshotRecord>> {
    let collection = parse_collection(text)?;
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = line_string_of(&feature, index)?;
            Ok(SnapshotRecord {
                geometry,
                properties: feature.properties.unwrap_or_default(),
            })
        })
        .collect()
}

/// Convert the named epoch-millisecond columns to RFC 3339 strings, in place.
///
/// Nulls stay null, and values that are not representable timestamps become
/// null rather than a fabricated date.
pub fn normalize_times(records: &mut [SnapshotRecord], columns: &[String]) {
    for record in records {
        for column in columns {
            if let Some(value) = record.properties.get_mut(column) {
                *value = normalize_epoch_ms(value);
            }
        }
    }
}

fn normalize_epoch_ms(value: &Json) -> Json {
    match value {
        Json::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|timestamp| Json::String(timestamp.to_rfc3339()))
            .unwrap_or(Json::Null),
        other => other.clone(),
    }
}
