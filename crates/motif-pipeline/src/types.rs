//! Shared types for the motif contour grouping pipeline.

use serde::{Deserialize, Serialize};

use crate::cluster::{AxisCuts, ClustererKind};
use crate::enhance::EnhanceMode;
use crate::features::FeatureRecord;
use crate::overlap::KeepPolicy;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the
/// original decoded image without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A closed polygonal boundary in pixel coordinates.
///
/// Produced by contour extraction as an ordered ring of pixel positions.
/// The closing edge from the last point back to the first is implicit.
/// Contours are immutable once extracted; derived quantities (area,
/// centroid, convex hull area, solidity) are computed on demand by
/// [`crate::geometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from a ring of boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of boundary points (a proxy for perimeter on
    /// pixel-resolution rings).
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all boundary points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying ring.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count as a float, for area normalization.
    #[must_use]
    pub fn area(self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}

/// Configuration for the contour grouping pipeline.
///
/// All parameters have defaults matching the reference behavior.
/// The enhancement mode is an explicit value here rather than shared
/// state: callers choose per invocation, and two concurrent batches
/// can use different modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Contrast enhancement applied before binarization, or `None` to
    /// binarize the grayscale image as-is.
    pub enhance: Option<EnhanceMode>,

    /// Which member of a near-concentric overlapping pair survives
    /// overlap resolution.
    pub keep: KeepPolicy,

    /// Which clustering implementation labels each feature axis.
    pub clusterer: ClustererKind,

    /// Dendrogram cut policy per feature axis.
    pub cuts: AxisCuts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enhance: Some(EnhanceMode::Local),
            keep: KeepPolicy::Inner,
            clusterer: ClustererKind::default(),
            cuts: AxisCuts::default(),
        }
    }
}

/// One recurring motif: the contours that share a composite cluster
/// label, with their extracted feature records in matching order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifGroup {
    /// Member contours, in pipeline order.
    pub contours: Vec<Contour>,
    /// Feature records, 1:1 with `contours`.
    pub features: Vec<FeatureRecord>,
}

impl MotifGroup {
    /// Group weight: the member count, used downstream to arbitrate
    /// overlap conflicts between groups.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.contours.len()
    }
}

/// Non-fatal conditions raised while processing one batch.
///
/// Warnings accompany a valid (possibly empty) result; they never
/// abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchWarning {
    /// Fewer contours survived filtering and overlap resolution than
    /// clustering needs; the batch yields zero groups.
    InsufficientCandidates {
        /// How many contours survived.
        survivors: usize,
    },
}

/// Result of running the full contour grouping pipeline on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Recurring motif groups found in the image. May be empty.
    pub groups: Vec<MotifGroup>,

    /// Non-fatal conditions encountered while processing.
    pub warnings: Vec<BatchWarning>,

    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A contour with undefined area or centroid reached a component
    /// that requires both. Such contours must be excluded during or
    /// immediately after extraction.
    #[error("contour has undefined area or centroid")]
    DegenerateContour,

    /// Feature vectors passed to clustering do not all have the same
    /// length.
    #[error("feature vectors have mismatched lengths ({expected} vs {actual})")]
    FeatureShapeMismatch {
        /// Length of the first feature vector.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A clustering implementation returned the wrong number of labels.
    #[error("clustering returned {actual} labels for {expected} inputs")]
    LabelLengthMismatch {
        /// Number of input feature vectors.
        expected: usize,
        /// Number of labels returned.
        actual: usize,
    },

    /// Feature extraction or clustering input contained NaN or
    /// infinity. The batch is aborted rather than guessing.
    #[error("feature data contains a non-finite value")]
    NonFiniteFeature,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_new() {
        let p = Point::new(3.0, 4.0);
        assert!((p.x - 3.0).abs() < f64::EPSILON);
        assert!((p.y - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(7.0, 11.0);
        assert!(p.distance(p).abs() < f64::EPSILON);
    }

    // --- Contour tests ---

    #[test]
    fn contour_new_and_point_count() {
        let c = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]);
        assert_eq!(c.point_count(), 3);
        assert!(!c.is_empty());
    }

    #[test]
    fn contour_empty() {
        let c = Contour::new(vec![]);
        assert!(c.is_empty());
        assert_eq!(c.point_count(), 0);
    }

    #[test]
    fn contour_points_round_trip() {
        let points = vec![Point::new(0.0, 0.0), Point::new(2.0, 3.0)];
        let c = Contour::new(points.clone());
        assert_eq!(c.points(), &points);
        assert_eq!(c.into_points(), points);
    }

    // --- Dimensions tests ---

    #[test]
    fn dimensions_area() {
        let d = Dimensions {
            width: 640,
            height: 480,
        };
        assert!((d.area() - 307_200.0).abs() < f64::EPSILON);
    }

    // --- PipelineConfig tests ---

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.enhance, Some(EnhanceMode::Local));
        assert_eq!(config.keep, KeepPolicy::Inner);
        assert_eq!(config.clusterer, ClustererKind::Agglomerative);
    }

    #[test]
    fn config_serde_round_trip() {
        let config = PipelineConfig {
            enhance: None,
            keep: KeepPolicy::Outer,
            ..PipelineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    // --- MotifGroup tests ---

    #[test]
    fn group_weight_is_member_count() {
        let contour = Contour::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let record = FeatureRecord {
            shape: vec![1.0],
            color: [50.0, 0.0, 0.0],
            size: 0.01,
            color_gradient: 0.0,
        };
        let group = MotifGroup {
            contours: vec![contour.clone(), contour],
            features: vec![record.clone(), record],
        };
        assert_eq!(group.weight(), 2);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_empty_input_display() {
        let err = PipelineError::EmptyInput;
        assert_eq!(err.to_string(), "input image data is empty");
    }

    #[test]
    fn error_degenerate_contour_display() {
        let err = PipelineError::DegenerateContour;
        assert_eq!(err.to_string(), "contour has undefined area or centroid");
    }

    #[test]
    fn error_label_length_display() {
        let err = PipelineError::LabelLengthMismatch {
            expected: 5,
            actual: 3,
        };
        assert_eq!(err.to_string(), "clustering returned 3 labels for 5 inputs");
    }
}
