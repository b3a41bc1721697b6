//! Overlap detection and resolution between candidate contours.
//!
//! Border following frequently reports the same visual feature twice:
//! a ring traced along the inside and the outside of the same stroke.
//! Two contours count as overlapping when one's centroid lies well
//! inside the other's boundary *and* their internal radii are
//! comparable — near-concentric, near-equal-size nesting. The resolver
//! discards the redundant member of every such pair according to a
//! [`KeepPolicy`].
//!
//! Overlap decisions are made against the full input set, never
//! iteratively: a contour discarded in one pair still disqualifies
//! partners in other pairs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{Contour, PipelineError, Point};

/// Minimum ratio between the two internal radii for a pair to count
/// as overlapping (smaller over larger).
pub const RADIUS_RATIO: f64 = 2.0 / 3.0;

/// Which member of a near-concentric overlapping pair survives.
///
/// Contours are ordered small-to-large before pairing, so `Inner`
/// keeps the earlier (smaller) ring of each pair and `Outer` keeps the
/// later (larger) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeepPolicy {
    /// Keep the smaller ring, discard the larger.
    #[default]
    Inner,
    /// Keep the larger ring, discard the smaller.
    Outer,
}

/// Result of overlap resolution: survivors and discards, both in the
/// small-to-large working order. Together they partition the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Contours that survived resolution.
    pub kept: Vec<Contour>,
    /// Contours discarded as redundant pair members.
    pub discarded: Vec<Contour>,
}

/// Centroid and internal radius of one contour, precomputed once so
/// the quadratic pair scan stays cheap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OverlapProfile {
    centroid: Point,
    inradius: f64,
}

/// Compute the overlap profile of a contour.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateContour`] when the centroid is
/// undefined. Extraction excludes such rings, so hitting this from the
/// pipeline indicates a caller passed hand-built degenerate input.
pub(crate) fn overlap_profile(contour: &Contour) -> Result<OverlapProfile, PipelineError> {
    let centroid = geometry::centroid(contour).ok_or(PipelineError::DegenerateContour)?;
    let inradius = geometry::signed_boundary_distance(centroid, contour).abs();
    Ok(OverlapProfile { centroid, inradius })
}

/// The overlap predicate on precomputed profiles.
///
/// True iff the centroid distance is below both internal radii and the
/// radii are within [`RADIUS_RATIO`] of each other. Symmetric by
/// construction.
pub(crate) fn profiles_overlap(a: OverlapProfile, b: OverlapProfile) -> bool {
    let near = a.inradius.min(b.inradius);
    let far = a.inradius.max(b.inradius);
    if far <= 0.0 {
        return false;
    }
    a.centroid.distance(b.centroid) < near && near / far > RADIUS_RATIO
}

/// Whether two contours are near-concentric, near-equal-size nested
/// rings.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateContour`] if either contour has
/// an undefined centroid.
pub fn is_overlap(a: &Contour, b: &Contour) -> Result<bool, PipelineError> {
    Ok(profiles_overlap(overlap_profile(a)?, overlap_profile(b)?))
}

/// Detect overlapping pairs and discard the redundant member of each.
///
/// Contours are first stably sorted ascending by point count. Every
/// unordered pair of the sorted list is tested once; each overlapping
/// pair contributes the later index (`keep == Inner`) or the earlier
/// index (`keep == Outer`) to a deduplicated discard set. Both output
/// lists preserve the sorted order.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateContour`] if any input contour
/// has an undefined centroid.
pub fn resolve(contours: Vec<Contour>, keep: KeepPolicy) -> Result<Resolution, PipelineError> {
    let mut contours = contours;
    contours.sort_by_key(Contour::point_count);

    let profiles: Vec<OverlapProfile> = contours
        .iter()
        .map(overlap_profile)
        .collect::<Result<_, _>>()?;

    let mut discard = BTreeSet::new();
    for i in 0..profiles.len() {
        for j in (i + 1)..profiles.len() {
            if profiles_overlap(profiles[i], profiles[j]) {
                discard.insert(match keep {
                    KeepPolicy::Inner => j,
                    KeepPolicy::Outer => i,
                });
            }
        }
    }

    let mut kept = Vec::with_capacity(contours.len() - discard.len());
    let mut discarded = Vec::with_capacity(discard.len());
    for (idx, contour) in contours.into_iter().enumerate() {
        if discard.contains(&idx) {
            discarded.push(contour);
        } else {
            kept.push(contour);
        }
    }

    Ok(Resolution { kept, discarded })
}
