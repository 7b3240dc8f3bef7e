//! Tabular export of the annotated batch
//!
//! After reconciliation every snapshot record carries a resolved
//! `segment_id`. Two artifacts are written per run: the daily CSV for this
//! snapshot, and a cumulative combined CSV that is appended to and
//! deduplicated across runs. Geometry is dropped from both; it lives in the
//! registry.

use crate::error::{PipelineError, Result};
use crate::snapshot::SnapshotRecord;
use serde_json::Value as Json;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

pub type Row = Vec<String>;

/// Column order for the export: `segment_id` first, then every property key
/// seen in the batch, sorted for determinism.
pub fn header_for(records: &[SnapshotRecord]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for record in records {
        keys.extend(record.properties.keys().cloned());
    }
    let mut header = vec!["segment_id".to_string()];
    header.extend(keys);
    header
}

/// Render records into rows under `header`, attaching the resolved ids.
pub fn rows_for(records: &[SnapshotRecord], ids: &[u64], header: &[String]) -> Vec<Row> {
    records
        .iter()
        .zip(ids)
        .map(|(record, &id)| {
            header
                .iter()
                .map(|column| {
                    if column == "segment_id" {
                        id.to_string()
                    } else {
                        cell_of(record.properties.get(column))
                    }
                })
                .collect()
        })
        .collect()
}

fn cell_of(value: Option<&Json>) -> String {
    match value {
        None | Some(Json::Null) => String::new(),
        Some(Json::String(s)) => s.clone(),
        Some(Json::Number(n)) => n.to_string(),
        Some(Json::Bool(b)) => b.to_string(),
        // Nested values are rare in source attributes; keep them as JSON text
        Some(other) => other.to_string(),
    }
}

/// Write this run's annotated rows.
pub fn write_daily_csv(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    write_csv(path, header, rows.iter())
}

/// Merge this run's rows into the cumulative export.
///
/// Existing rows keep their position; new rows are appended in batch order
/// with exact duplicates dropped, mirroring a concat-then-deduplicate of the
/// whole history.
pub fn append_combined_csv(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    let existing = if path.exists() {
        read_rows(path, header)?
    } else {
        Vec::new()
    };
    let merged = merge_combined_rows(&existing, rows);
    write_csv(path, header, merged.iter())
}

/// Deduplicate while preserving first-seen order.
pub fn merge_combined_rows(existing: &[Row], fresh: &[Row]) -> Vec<Row> {
    let mut seen: HashSet<&Row> = HashSet::new();
    existing
        .iter()
        .chain(fresh)
        .filter(|row| seen.insert(*row))
        .cloned()
        .collect()
}

fn read_rows(path: &Path, expected_header: &[String]) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header != expected_header {
        return Err(PipelineError::CombinedHeaderMismatch {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn write_csv<'a>(
    path: &Path,
    header: &[String],
    rows: impl Iterator<Item = &'a Row>,
) -> Result<()> {
    let temp = path.with_extension("tmp");
    let mut writer = csv::Writer::from_path(&temp)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|source| PipelineError::Write {
        path: temp.clone(),
        source,
    })?;
    drop(writer);
    fs::rename(&temp, path).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
