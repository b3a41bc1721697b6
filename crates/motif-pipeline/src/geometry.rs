//! Geometric primitives over contours.
//!
//! Everything downstream of extraction asks geometric questions through
//! this module: polygon area, moment-based centroid, convex hull area,
//! solidity, signed point-to-boundary distance, and a vertex count
//! after Ramer-Douglas-Peucker approximation. Area, centroid, hull and
//! containment come from the `geo` crate; conversions between pipeline
//! points and `geo` types happen only at this module boundary.

use geo::line_measures::Distance;
use geo::{Area, Centroid, Contains, ConvexHull, Euclidean, LineString, Polygon};

use crate::types::{Contour, Point};

/// Convert a contour ring to a `geo::Polygon`.
///
/// `Polygon::new` implicitly closes the exterior ring, matching the
/// contour's implicit closing edge.
fn to_polygon(contour: &Contour) -> Polygon<f64> {
    let coords: Vec<geo::Coord<f64>> = contour
        .points()
        .iter()
        .map(|p| geo::Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(LineString::new(coords), Vec::new())
}

/// Polygon area of a contour (non-negative).
///
/// Contours with fewer than 3 points have zero area.
#[must_use]
pub fn area(contour: &Contour) -> f64 {
    if contour.point_count() < 3 {
        return 0.0;
    }
    to_polygon(contour).unsigned_area()
}

/// Area-weighted (moment-based) centroid of a contour.
///
/// Returns `None` when the centroid is undefined: fewer than 3 points
/// or zero enclosed area. Callers that require a centroid must treat
/// `None` as a degenerate contour.
#[must_use]
pub fn centroid(contour: &Contour) -> Option<Point> {
    if contour.point_count() < 3 {
        return None;
    }
    let polygon = to_polygon(contour);
    if polygon.unsigned_area() <= 0.0 {
        return None;
    }
    polygon.centroid().map(|c| Point::new(c.x(), c.y()))
}

/// Area of the contour's convex hull.
#[must_use]
pub fn convex_hull_area(contour: &Contour) -> f64 {
    if contour.point_count() < 3 {
        return 0.0;
    }
    to_polygon(contour).convex_hull().unsigned_area()
}

/// Solidity: the ratio of a contour's area to its convex hull's area.
///
/// Returns `None` when the hull area is zero (collinear or degenerate
/// rings), where the ratio is undefined.
#[must_use]
pub fn solidity(contour: &Contour) -> Option<f64> {
    let hull_area = convex_hull_area(contour);
    if hull_area <= 0.0 {
        return None;
    }
    Some(area(contour) / hull_area)
}

/// Signed distance from a point to a contour's boundary.
///
/// Positive inside the ring, negative outside, approaching zero on the
/// boundary. The magnitude is the Euclidean distance to the nearest
/// boundary segment.
#[must_use]
pub fn signed_boundary_distance(p: Point, contour: &Contour) -> f64 {
    let polygon = to_polygon(contour);
    let query = geo::Point::new(p.x, p.y);
    let distance = Euclidean.distance(&query, polygon.exterior());
    if polygon.contains(&query) {
        distance
    } else {
        -distance
    }
}

/// Arc length of the closed ring, including the implicit closing edge.
#[must_use]
pub fn arc_length(contour: &Contour) -> f64 {
    let points = contour.points();
    if points.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..points.len() {
        let next = points[(i + 1) % points.len()];
        total += points[i].distance(next);
    }
    total
}

/// Number of vertices kept when the ring is approximated with the
/// Ramer-Douglas-Peucker algorithm at the given tolerance.
///
/// A high count after approximation indicates a jagged, noisy
/// boundary. The ring is split into two chains at the point farthest
/// from the ring's first point, so the closing edge participates in
/// the approximation like any other.
#[must_use]
pub fn approx_vertex_count(contour: &Contour, tolerance: f64) -> usize {
    let points = contour.points();
    let n = points.len();
    if n < 3 {
        return n;
    }

    let mut far = 1;
    let mut far_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = points[0].distance_squared(*p);
        if d > far_dist {
            far_dist = d;
            far = i;
        }
    }

    let mut kept = vec![false; n];
    kept[0] = true;
    kept[far] = true;

    // Forward chain 0..=far, then the wrap-around chain far..n plus
    // the ring's first point as the closing endpoint.
    let forward: Vec<usize> = (0..=far).collect();
    let wrap: Vec<usize> = (far..n).chain(std::iter::once(0)).collect();
    rdp_mark(points, &forward, 0, forward.len() - 1, tolerance, &mut kept);
    rdp_mark(points, &wrap, 0, wrap.len() - 1, tolerance, &mut kept);

    kept.iter().filter(|&&k| k).count()
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm over a chain
/// of ring indices.
///
/// Finds the chain point between `start` and `end` farthest from the
/// segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-chains are processed recursively.
fn rdp_mark(
    points: &[Point],
    chain: &[usize],
    start: usize,
    end: usize,
    tolerance: f64,
    kept: &mut [bool],
) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_pos = start;

    for pos in (start + 1)..end {
        let d = perpendicular_distance(
            points[chain[pos]],
            points[chain[start]],
            points[chain[end]],
        );
        if d > max_dist {
            max_dist = d;
            max_pos = pos;
        }
    }

    if max_dist > tolerance {
        kept[chain[max_pos]] = true;
        rdp_mark(points, chain, start, max_pos, tolerance, kept);
        rdp_mark(points, chain, max_pos, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        // a and b are the same point.
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
