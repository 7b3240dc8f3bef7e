//! Anchor derivation: one representative planar point and length per geometry
//!
//! The matching feature for a segment is its line centroid plus its planar
//! length. Both are recomputed from geometry on every run; nothing derived is
//! ever treated as authoritative or persisted independently.

use geo::{Centroid, LineString, Point};

/// Derive the matching feature of a polyline: `(anchor_point, length)`.
///
/// The anchor is the line centroid (not the bounding-box center), in the
/// working projected coordinate system. The length is the sum of Euclidean
/// edge lengths in the same linear unit.
///
/// Degenerate single-point geometries are valid: the anchor is the point
/// itself and the length is zero. An empty coordinate sequence has no
/// centroid and returns `None`; the caller decides how to surface it.
pub fn anchor_of(geometry: &LineString<f64>) -> Option<(Point<f64>, f64)> {
    let anchor = geometry.centroid()?;
    Some((anchor, planar_length(geometry)))
}

/// Planar Euclidean length of a polyline, zero for a single point.
#[inline]
pub fn planar_length(geometry: &LineString<f64>) -> f64 {
    geometry.lines().map(|edge| edge.dx().hypot(edge.dy())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(coords.iter().map(|&(x, y)| Coord { x, y }).collect())
    }

    #[test]
    fn test_anchor_of_straight_line() {
        let (anchor, length) = anchor_of(&line(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
        assert!((anchor.x() - 5.0).abs() < 1e-9);
        assert!((anchor.y() - 0.0).abs() < 1e-9);
        assert!((length - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_of_polyline_length_sums_edges() {
        let (_, length) = anchor_of(&line(&[(0.0, 0.0), (3.0, 4.0), (3.0, 14.0)])).unwrap();
        // 3-4-5 triangle edge plus a vertical edge
        assert!((length - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_is_length_weighted_not_vertex_mean() {
        // Three collinear vertices, unevenly spaced: the line centroid stays at
        // the geometric middle, while a vertex mean would be pulled left.
        let (anchor, _) = anchor_of(&line(&[(0.0, 0.0), (1.0, 0.0), (10.0, 0.0)])).unwrap();
        assert!((anchor.x() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_its_own_anchor() {
        let (anchor, length) = anchor_of(&line(&[(7.0, -3.0)])).unwrap();
        assert_eq!(anchor, Point::new(7.0, -3.0));
        assert_eq!(length, 0.0);
    }

    #[test]
    fn test_empty_geometry_has_no_anchor() {
        assert!(anchor_of(&line(&[])).is_none());
    }
}
