//! Matched/novel decision rule
//!
//! A batch record matches a registry segment only when it is both near the
//! segment's anchor and similar in length. Proximity alone is insufficient: a
//! short alley next to a long avenue must not be conflated, so both cutoffs
//! must hold. The policy is strictly binary; there is no fuzzy tier.

/// Distance and length-difference cutoffs, in the working linear unit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thresholds {
    /// Maximum anchor-to-anchor distance for a match (exclusive)
    pub dist_cutoff: f64,
    /// Maximum absolute length difference for a match (exclusive)
    pub len_cutoff: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dist_cutoff: 10.0,
            len_cutoff: 10.0,
        }
    }
}

/// The nearest registry segment found for a batch record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Stable identifier of the nearest registry segment
    pub id: u64,
    /// Euclidean distance between the two anchors
    pub distance: f64,
    /// Absolute difference of planar lengths
    pub len_diff: f64,
}

/// Outcome of classifying one batch record.
///
/// A tagged two-variant result rather than a nullable id, so callers must
/// handle both outcomes explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Reuse the matched registry segment's identifier
    Matched { id: u64 },
    /// Assign a fresh identifier and grow the registry
    Novel,
}

impl Thresholds {
    /// Classify a batch record against its nearest registry candidate.
    ///
    /// Matched iff `distance < dist_cutoff` AND `len_diff < len_cutoff`, both
    /// strict. A record whose distance equals the cutoff exactly is novel.
    /// With no candidate (empty registry) the record is unconditionally novel.
    pub fn classify(&self, candidate: Option<Candidate>) -> Resolution {
        match candidate {
            Some(c) if c.distance < self.dist_cutoff && c.len_diff < self.len_cutoff => {
                Resolution::Matched { id: c.id }
            }
            _ => Resolution::Novel,
        }
    }
}
