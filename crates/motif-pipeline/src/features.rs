//! Per-contour feature extraction.
//!
//! Produces one [`FeatureRecord`] per surviving contour, sampled from
//! the original color image:
//!
//! - `shape`: pixel-distance profile — the boundary resampled to
//!   [`SHAPE_PROFILE_SAMPLES`] points, distance from the centroid to
//!   each sample, normalized by the maximum distance.
//! - `color`: mean CIE Lab triplet over the contour's filled interior.
//! - `size`: contour area normalized by image area.
//! - `color_gradient`: mean 3x3 Laplacian magnitude across the Lab
//!   channels along the boundary.
//!
//! Records are created once per contour and never mutated. Non-finite
//! values abort the batch rather than being substituted.

use image::{GrayImage, RgbImage};
use palette::{FromColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{Contour, Dimensions, PipelineError, Point};

/// Number of boundary samples in the shape descriptor.
pub const SHAPE_PROFILE_SAMPLES: usize = 32;

/// Extracted features of one contour. 1:1 with its contour and
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Normalized centroid-to-boundary distance profile.
    pub shape: Vec<f64>,
    /// Mean CIE Lab color over the contour interior.
    pub color: [f64; 3],
    /// Contour area as a fraction of image area.
    pub size: f64,
    /// Mean local color-edge strength along the boundary.
    pub color_gradient: f64,
}

/// Extract one feature record per contour, in input order.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateContour`] if a contour has an
/// undefined centroid, and [`PipelineError::NonFiniteFeature`] if any
/// computed feature is NaN or infinite.
pub fn extract_features(
    image: &RgbImage,
    contours: &[Contour],
) -> Result<Vec<FeatureRecord>, PipelineError> {
    let plane = LabPlane::from_image(image);
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };

    contours
        .iter()
        .map(|contour| extract_one(&plane, dimensions, contour))
        .collect()
}

fn extract_one(
    plane: &LabPlane,
    dimensions: Dimensions,
    contour: &Contour,
) -> Result<FeatureRecord, PipelineError> {
    let centroid = geometry::centroid(contour).ok_or(PipelineError::DegenerateContour)?;

    let record = FeatureRecord {
        shape: distance_profile(contour, centroid),
        color: plane.interior_mean(contour),
        size: geometry::area(contour) / dimensions.area(),
        color_gradient: plane.boundary_gradient(contour),
    };

    let finite = record.shape.iter().all(|v| v.is_finite())
        && record.color.iter().all(|v| v.is_finite())
        && record.size.is_finite()
        && record.color_gradient.is_finite();
    if finite {
        Ok(record)
    } else {
        Err(PipelineError::NonFiniteFeature)
    }
}

/// Normalized centroid-to-boundary distance profile.
///
/// The boundary is resampled by index to a fixed sample count, so
/// rings of different point counts become comparable vectors. Dividing
/// by the maximum distance removes scale, leaving shape alone — size
/// is its own feature axis.
fn distance_profile(contour: &Contour, centroid: Point) -> Vec<f64> {
    let points = contour.points();
    let n = points.len();
    let mut profile: Vec<f64> = (0..SHAPE_PROFILE_SAMPLES)
        .map(|k| centroid.distance(points[k * n / SHAPE_PROFILE_SAMPLES]))
        .collect();

    let max = profile.iter().fold(0.0_f64, |acc, &d| acc.max(d));
    if max > 0.0 {
        for d in &mut profile {
            *d /= max;
        }
    }
    profile
}

/// Per-pixel CIE Lab plane of the source image.
///
/// Converted once per batch; contour-level sampling then reads plain
/// float triplets.
struct LabPlane {
    width: u32,
    height: u32,
    values: Vec<[f64; 3]>,
}

impl LabPlane {
    fn from_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let values = image
            .pixels()
            .map(|p| {
                let srgb: Srgb<f32> = Srgb::new(
                    f32::from(p.0[0]) / 255.0,
                    f32::from(p.0[1]) / 255.0,
                    f32::from(p.0[2]) / 255.0,
                );
                let linear: LinSrgb<f32> = srgb.into_linear();
                let lab: Lab = Lab::from_color(linear);
                [f64::from(lab.l), f64::from(lab.a), f64::from(lab.b)]
            })
            .collect();
        Self {
            width,
            height,
            values,
        }
    }

    fn get(&self, x: u32, y: u32) -> [f64; 3] {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Mean Lab color over the contour's filled interior mask.
    ///
    /// Falls back to the boundary points themselves when the filled
    /// mask is empty (extremely thin rings).
    #[allow(clippy::cast_possible_truncation)]
    fn interior_mean(&self, contour: &Contour) -> [f64; 3] {
        let mut mask = GrayImage::new(self.width, self.height);
        let mut polygon: Vec<imageproc::point::Point<i32>> = Vec::new();
        for p in contour.points() {
            let point = imageproc::point::Point::new(p.x as i32, p.y as i32);
            if polygon.last() != Some(&point) {
                polygon.push(point);
            }
        }
        if polygon.last() == polygon.first() && polygon.len() > 1 {
            polygon.pop();
        }
        if polygon.len() >= 3 {
            imageproc::drawing::draw_polygon_mut(&mut mask, &polygon, image::Luma([255]));
        }

        let mut sum = [0.0_f64; 3];
        let mut count = 0.0;
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel.0[0] > 0 {
                let lab = self.get(x, y);
                sum[0] += lab[0];
                sum[1] += lab[1];
                sum[2] += lab[2];
                count += 1.0;
            }
        }

        if count == 0.0 {
            for p in contour.points() {
                if let Some(lab) = self.get_clamped(*p) {
                    sum[0] += lab[0];
                    sum[1] += lab[1];
                    sum[2] += lab[2];
                    count += 1.0;
                }
            }
        }
        if count == 0.0 {
            return [0.0; 3];
        }
        [sum[0] / count, sum[1] / count, sum[2] / count]
    }

    /// Mean Laplacian magnitude over the Lab channels along the
    /// boundary. Points on the image border are skipped; a boundary
    /// with no interior-adjacent points scores zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn boundary_gradient(&self, contour: &Contour) -> f64 {
        let mut total = 0.0;
        let mut count = 0.0;
        for p in contour.points() {
            let x = p.x as i64;
            let y = p.y as i64;
            if x < 1 || y < 1 || x >= i64::from(self.width) - 1 || y >= i64::from(self.height) - 1
            {
                continue;
            }
            let (x, y) = (x as u32, y as u32);

            // 3x3 Laplacian per Lab channel: 8*center - neighbors.
            let mut lap = [0.0_f64; 3];
            let center = self.get(x, y);
            for c in 0..3 {
                lap[c] = 8.0 * center[c];
            }
            for dy in -1_i64..=1 {
                for dx in -1_i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let neighbor =
                        self.get((i64::from(x) + dx) as u32, (i64::from(y) + dy) as u32);
                    for c in 0..3 {
                        lap[c] -= neighbor[c];
                    }
                }
            }
            total += lap[0]
                .mul_add(lap[0], lap[1].mul_add(lap[1], lap[2] * lap[2]))
                .sqrt();
            count += 1.0;
        }
        if count == 0.0 { 0.0 } else { total / count }
    }

    fn get_clamped(&self, p: Point) -> Option<[f64; 3]> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (p.x as u32, p.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.get(x, y))
    }
}
