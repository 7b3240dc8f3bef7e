//! Per-run spatial index over registry anchor points
//!
//! The index is a disposable derived structure: built once per run from the
//! registry snapshot taken before any merging, queried read-only, and
//! discarded afterwards. It is never updated incrementally or shared across
//! runs, so batch records can only match the pre-run registry, never each
//! other.

use geo::Point;
use rstar::PointDistance;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// R-tree entry: anchor coordinates tagged with the registry ordinal.
type AnchorEntry = GeomWithData<[f64; 2], usize>;

/// Nearest-neighbor index over the anchor points of the registry.
pub struct AnchorIndex {
    tree: RTree<AnchorEntry>,
}

impl AnchorIndex {
    /// Bulk-load the index from registry anchors, in registry order.
    ///
    /// The stored payload is each anchor's ordinal position, so query results
    /// can be mapped back to registry segments.
    pub fn build(anchors: &[Point<f64>]) -> Self {
        let entries: Vec<AnchorEntry> = anchors
            .iter()
            .enumerate()
            .map(|(ordinal, anchor)| AnchorEntry::new([anchor.x(), anchor.y()], ordinal))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Find the single nearest registry anchor to `query`.
    ///
    /// Returns the registry ordinal and the Euclidean distance, or `None` if
    /// the index is empty (an empty registry makes every batch record novel,
    /// it is not an error).
    pub fn nearest(&self, query: Point<f64>) -> Option<(usize, f64)> {
        let target = [query.x(), query.y()];
        let entry = self.tree.nearest_neighbor(&target)?;
        Some((entry.data, entry.distance_2(&target).sqrt()))
    }

    /// Number of indexed anchors
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index holds no anchors
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<Point<f64>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_empty_index_returns_no_neighbor() {
        let index = AnchorIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.nearest(Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_nearest_returns_closest_ordinal_and_distance() {
        let index = AnchorIndex::build(&points(&[(0.0, 0.0), (100.0, 0.0), (0.0, 50.0)]));
        let (ordinal, distance) = index.nearest(Point::new(97.0, 4.0)).unwrap();
        assert_eq!(ordinal, 1);
        assert!((distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_exactly_one_neighbor_even_with_near_ties() {
        let index = AnchorIndex::build(&points(&[(-1.0, 0.0), (1.0, 0.0)]));
        // Query equidistant from both anchors still yields a single result.
        let (ordinal, distance) = index.nearest(Point::new(0.0, 0.0)).unwrap();
        assert!(ordinal < 2);
        assert!((distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_query_does_not_mutate_index() {
        let index = AnchorIndex::build(&points(&[(3.0, 3.0)]));
        for _ in 0..10 {
            assert_eq!(index.nearest(Point::new(0.0, 0.0)).unwrap().0, 0);
        }
        assert_eq!(index.len(), 1);
    }
}
