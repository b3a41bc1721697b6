//! Contour extraction: closed pixel rings from a binary image.
//!
//! Wraps Suzuki-Abe border following
//! ([`imageproc::contours::find_contours`]) and converts the integer
//! grid rings into pipeline [`Contour`]s, keeping the outer/hole
//! topology and parent nesting that border following reports.
//!
//! Degenerate rings (fewer than 3 points, zero enclosed area, or an
//! undefined centroid) are excluded here, at the extraction boundary.
//! Everything downstream may therefore assume that area and centroid
//! are defined for every contour it receives.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{Contour, Point};

/// Whether a ring bounds a foreground region from the outside or
/// encloses a background hole within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingKind {
    /// Outer border of a foreground region.
    Outer,
    /// Border of a hole inside a foreground region.
    Hole,
}

/// One extracted ring with its nesting topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContour {
    /// The closed boundary ring.
    pub contour: Contour,
    /// Outer border or hole border.
    pub kind: RingKind,
    /// Index of the enclosing ring in the returned list, if it
    /// survived degeneracy filtering.
    pub parent: Option<usize>,
}

/// Extract closed contours from a binary image.
///
/// Non-zero pixels are foreground. Degenerate rings are dropped and
/// parent links are remapped to the surviving list (a parent that was
/// itself dropped becomes `None`). Output order follows the border
/// following scan order.
#[must_use = "returns the extracted contours"]
pub fn extract_contours(binary: &GrayImage) -> Vec<ExtractedContour> {
    let raw: Vec<imageproc::contours::Contour<i32>> = imageproc::contours::find_contours(binary);

    // First pass: decide which raw rings survive, remembering the
    // old-index -> new-index mapping for parent links.
    let mut new_index: Vec<Option<usize>> = vec![None; raw.len()];
    let mut kept = 0;
    for (i, c) in raw.iter().enumerate() {
        if is_well_formed(&c.points) {
            new_index[i] = Some(kept);
            kept += 1;
        }
    }

    raw.into_iter()
        .enumerate()
        .filter_map(|(i, c)| {
            new_index[i]?;
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            let kind = match c.border_type {
                imageproc::contours::BorderType::Outer => RingKind::Outer,
                imageproc::contours::BorderType::Hole => RingKind::Hole,
            };
            Some(ExtractedContour {
                contour: Contour::new(points),
                kind,
                parent: c.parent.and_then(|p| new_index[p]),
            })
        })
        .collect()
}

/// A ring is well-formed when its area and centroid are both defined.
fn is_well_formed(points: &[imageproc::point::Point<i32>]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let ring = Contour::new(
        points
            .iter()
            .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
            .collect(),
    );
    geometry::centroid(&ring).is_some()
}
