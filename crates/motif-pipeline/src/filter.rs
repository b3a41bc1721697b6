//! Geometric admissibility filtering of extracted contours.
//!
//! Rejects contours that cannot plausibly be a motif boundary before
//! any pairwise work happens: too few or too many boundary points,
//! implausible area relative to the frame, low solidity, or a jagged
//! boundary that survives polygon approximation with too many
//! vertices. Each rule applies independently; failing any one excludes
//! the contour. This filter is also the primary control on the input
//! size of the quadratic stages downstream.

use crate::geometry;
use crate::types::{Contour, Dimensions};

/// Minimum boundary point count for a meaningful ring.
pub const MIN_BOUNDARY_POINTS: usize = 60;

/// Maximum contour area as a fraction of the image area.
pub const MAX_AREA_FRACTION: f64 = 1.0 / 5.0;

/// Minimum contour area as a fraction of the image area.
pub const MIN_AREA_FRACTION: f64 = 1.0 / 30_000.0;

/// Minimum solidity (area over convex hull area).
pub const MIN_SOLIDITY: f64 = 0.5;

/// Maximum vertex count after polygon approximation.
pub const MAX_APPROX_VERTICES: usize = 50;

/// Polygon approximation tolerance as a fraction of the boundary's
/// arc length.
pub const APPROX_EPSILON_FRACTION: f64 = 0.01;

/// Keep only geometrically admissible contours, preserving input order.
///
/// Deterministic and idempotent: filtering an already-filtered list
/// changes nothing.
#[must_use = "returns the admissible contours"]
pub fn filter_contours(contours: Vec<Contour>, dimensions: Dimensions) -> Vec<Contour> {
    contours
        .into_iter()
        .filter(|c| is_admissible(c, dimensions))
        .collect()
}

/// Apply every admissibility rule to one contour.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn is_admissible(contour: &Contour, dimensions: Dimensions) -> bool {
    let point_count = contour.point_count();
    if point_count < MIN_BOUNDARY_POINTS {
        return false;
    }
    let frame_limit = f64::from(dimensions.height + dimensions.width) * 2.0 / 3.0;
    if point_count as f64 > frame_limit {
        return false;
    }

    let image_area = dimensions.area();
    let area = geometry::area(contour);
    if area < image_area * MIN_AREA_FRACTION || area > image_area * MAX_AREA_FRACTION {
        return false;
    }

    match geometry::solidity(contour) {
        Some(s) if s >= MIN_SOLIDITY => {}
        _ => return false,
    }

    let epsilon = APPROX_EPSILON_FRACTION * geometry::arc_length(contour);
    geometry::approx_vertex_count(contour, epsilon) <= MAX_APPROX_VERTICES
}
