//! The canonical segment registry and the batch reconciliation entry point
//!
//! The registry is an append-only census of every street segment ever
//! recognized. Segments are immutable once inserted: a matched observation
//! never updates the stored geometry, and "updating" the registry means
//! producing a new collection value through [`Registry::reconcile`], the
//! single mutation point of the engine.

use crate::anchor::anchor_of;
use crate::{AnchorIndex, Candidate, IdAllocator, RegistryError, Resolution, Result, Thresholds};
use geo::{LineString, Point};
use rayon::prelude::*;

/// One recognized street centerline segment.
///
/// `id` is stable across runs once assigned. The geometry is the polyline as
/// first observed, in the working projected coordinate system; its length and
/// anchor are derived on demand, never stored.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Registry-unique, stable identifier
    pub id: u64,
    /// Observed centerline polyline
    pub geometry: LineString<f64>,
}

/// Append-only collection of all recognized segments, keyed by id.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registry {
    segments: Vec<Segment>,
}

/// Result of reconciling one batch against the registry.
#[derive(Debug)]
pub struct Reconciliation {
    /// The input registry plus every novel segment, in append order
    pub registry: Registry,
    /// Resolved id per batch record, aligned with batch order.
    /// Callers zip this back onto their own records to annotate the batch.
    pub assigned_ids: Vec<u64>,
    /// How many batch records reused an existing id
    pub matched: usize,
}

impl Registry {
    /// Build a registry from existing segments, validating its invariants.
    ///
    /// Fails on a duplicate id or on a segment with an empty coordinate
    /// sequence; both indicate a corrupted persisted registry.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let registry = Self { segments };
        // The allocator performs the id uniqueness scan
        IdAllocator::from_registry(&registry)?;
        for (index, segment) in registry.segments.iter().enumerate() {
            if segment.geometry.0.is_empty() {
                return Err(RegistryError::MalformedGeometry { index });
            }
        }
        Ok(registry)
    }

    /// Seed a brand-new registry: no match phase, every geometry is taken
    /// as-is with freshly allocated ids starting at 0.
    pub fn bootstrap(geometries: Vec<LineString<f64>>) -> Result<Self> {
        let segments = geometries
            .into_iter()
            .enumerate()
            .map(|(index, geometry)| {
                if geometry.0.is_empty() {
                    return Err(RegistryError::MalformedGeometry { index });
                }
                Ok(Segment {
                    id: index as u64,
                    geometry,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Construct without invariant checks, for callers that already hold a
    /// validated segment list (or deliberately simulate a corrupted one).
    pub(crate) fn from_segments_unchecked(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// All segments, in append order
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of recognized segments
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the registry holds no segments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Highest id ever issued, `None` for an empty registry
    #[inline]
    pub fn max_id(&self) -> Option<u64> {
        self.segments.iter().map(|s| s.id).max()
    }

    /// Resolve one batch of observed geometries against this registry.
    ///
    /// Each record is matched to its nearest registry anchor and classified
    /// matched or novel under `thresholds`. Novel records receive fresh ids
    /// (allocated once for the whole batch, in batch order) and their
    /// geometries are appended; matched records reuse the existing id and
    /// leave the registry untouched. Matching is relative to the registry
    /// snapshot taken before this call: batch records never match each other
    /// within a run.
    ///
    /// The merge is all-or-nothing. Any malformed record aborts the whole
    /// call before a new registry is produced, so a caller that fails mid-run
    /// can keep using its old registry value.
    pub fn reconcile(
        &self,
        batch: &[LineString<f64>],
        thresholds: &Thresholds,
    ) -> Result<Reconciliation> {
        // Derive the matching features for both sides up front, so every
        // malformed record is surfaced before any growth happens.
        let registry_features = derive_features(&self.segments, |s| &s.geometry)?;
        let batch_features = derive_features(batch, |g| g)?;

        let anchors: Vec<Point<f64>> = registry_features.iter().map(|&(a, _)| a).collect();
        let index = AnchorIndex::build(&anchors);

        let resolutions: Vec<Resolution> = batch_features
            .iter()
            .map(|&(anchor, length)| {
                let candidate = index.nearest(anchor).map(|(ordinal, distance)| Candidate {
                    id: self.segments[ordinal].id,
                    distance,
                    len_diff: (length - registry_features[ordinal].1).abs(),
                });
                thresholds.classify(candidate)
            })
            .collect();

        let novel_count = resolutions
            .iter()
            .filter(|r| matches!(r, Resolution::Novel))
            .count();
        let mut allocator = IdAllocator::from_registry(self)?;
        let fresh = allocator.allocate(novel_count);

        let mut segments = self.segments.clone();
        let mut assigned_ids = Vec::with_capacity(batch.len());
        let mut next_fresh = 0usize;

        for (geometry, resolution) in batch.iter().zip(&resolutions) {
            match *resolution {
                Resolution::Matched { id } => assigned_ids.push(id),
                Resolution::Novel => {
                    // One fresh id per novel record, in batch order
                    let id = fresh[next_fresh];
                    next_fresh += 1;
                    assigned_ids.push(id);
                    segments.push(Segment {
                        id,
                        geometry: geometry.clone(),
                    });
                }
            }
        }

        let matched = batch.len() - novel_count;
        let fraction = if batch.is_empty() {
            1.0
        } else {
            matched as f64 / batch.len() as f64
        };
        tracing::info!(
            "Matched {} out of {} ({:.0}%)",
            matched,
            batch.len(),
            100.0 * fraction
        );

        Ok(Reconciliation {
            registry: Self { segments },
            assigned_ids,
            matched,
        })
    }
}

/// Compute `(anchor, length)` per record, failing on the first record whose
/// geometry cannot yield an anchor.
fn derive_features<T: Sync>(
    records: &[T],
    geometry: impl Fn(&T) -> &LineString<f64> + Send + Sync,
) -> Result<Vec<(Point<f64>, f64)>> {
    records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            anchor_of(geometry(record)).ok_or(RegistryError::MalformedGeometry { index })
        })
        .collect()
}
