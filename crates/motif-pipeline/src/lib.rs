//! motif-pipeline: contour grouping engine for design images (sans-IO).
//!
//! Finds recurring visual motifs — repeated icons, ornaments, aligned
//! marks — by extracting closed contours from an image and clustering
//! them across three independent feature axes:
//!
//! grayscale -> enhance -> binarize -> contour extraction ->
//! admissibility filter -> overlap resolution -> feature extraction ->
//! per-axis clustering -> composite-label groups.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Cross-batch overlap
//! arbitration ([`merge::merge_overlapping_groups`]) is exported as an
//! independent utility for callers that combine labeled contours from
//! several runs.

pub mod binarize;
pub mod cluster;
pub mod decode;
pub mod enhance;
pub mod extract;
pub mod features;
pub mod filter;
pub mod geometry;
pub mod merge;
pub mod overlap;
pub mod types;

pub use cluster::{AxisCuts, ClustererKind, CutPolicy, FeatureClustering, Group};
pub use enhance::EnhanceMode;
pub use extract::{ExtractedContour, RingKind};
pub use features::FeatureRecord;
pub use merge::{GroupLabel, LabeledContour};
pub use overlap::{KeepPolicy, Resolution};
pub use types::{
    BatchWarning, Contour, Dimensions, MotifGroup, PipelineConfig, PipelineError, Point,
    ProcessResult,
};

/// Run the full contour grouping pipeline on one image.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`ProcessResult`] with the recurring motif groups
/// found in the image. An image in which nothing recurs yields an
/// empty group list, not an error.
///
/// # Pipeline steps
///
/// 1. Decode image; keep the color plane and a grayscale reduction
/// 2. Optional contrast enhancement (local or global)
/// 3. Otsu binarization
/// 4. Contour extraction (degenerate rings excluded)
/// 5. Geometric admissibility filter
/// 6. Overlap resolution between near-concentric duplicate rings
/// 7. Feature extraction (shape, color, size, color gradient)
/// 8. Independent clustering per feature axis, composite-label groups
///
/// Fewer than [`cluster::MIN_CLUSTER_CANDIDATES`] surviving contours
/// short-circuits steps 7-8: the batch yields zero groups and a
/// [`BatchWarning::InsufficientCandidates`] warning instead of an
/// error, and a warning is logged.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image format is unrecognized,
/// and propagates feature-extraction and clustering failures
/// ([`PipelineError::NonFiniteFeature`],
/// [`PipelineError::LabelLengthMismatch`],
/// [`PipelineError::InvalidConfig`]).
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    // 1. Decode into color and grayscale planes.
    let (color, gray) = decode::decode_image(image_bytes)?;
    let dimensions = Dimensions {
        width: gray.width(),
        height: gray.height(),
    };

    // 2. Optional contrast enhancement.
    let prepared = match config.enhance {
        Some(mode) => enhance::enhance(&gray, mode),
        None => gray,
    };

    // 3. Otsu binarization.
    let binary = binarize::otsu_binarize(&prepared);

    // 4. Contour extraction. Topology is dropped here; the grouping
    // stages only need the rings.
    let contours: Vec<Contour> = extract::extract_contours(&binary)
        .into_iter()
        .map(|e| e.contour)
        .collect();

    // 5. Admissibility filter.
    let admitted = filter::filter_contours(contours, dimensions);

    // 6. Overlap resolution.
    let resolution = overlap::resolve(admitted, config.keep)?;
    let survivors = resolution.kept;
    log::debug!(
        "{} contours survived filtering and overlap resolution",
        survivors.len()
    );

    // Too few candidates: a valid empty batch, not an error.
    if survivors.len() < cluster::MIN_CLUSTER_CANDIDATES {
        log::warn!(
            "only {} contours survived; skipping clustering",
            survivors.len()
        );
        return Ok(ProcessResult {
            groups: Vec::new(),
            warnings: vec![BatchWarning::InsufficientCandidates {
                survivors: survivors.len(),
            }],
            dimensions,
        });
    }

    // 7. Feature extraction.
    let records = features::extract_features(&color, &survivors)?;

    // 8. Per-axis clustering and composite-label group formation.
    let groups = cluster::cluster_groups(&config.clusterer, &records, &config.cuts)?;

    let groups = groups
        .into_iter()
        .map(|g| MotifGroup {
            contours: g.members.iter().map(|&i| survivors[i].clone()).collect(),
            features: g.members.iter().map(|&i| records[i].clone()).collect(),
        })
        .collect();

    Ok(ProcessResult {
        groups,
        warnings: Vec::new(),
        dimensions,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Encode an RGB image as PNG bytes.
    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    fn draw_square(img: &mut RgbImage, x0: u32, y0: u32, side: u32, rgb: [u8; 3]) {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, image::Rgb(rgb));
            }
        }
    }

    /// White 200x200 canvas with three identical navy squares and two
    /// odd-one-out shapes.
    fn recurring_squares_png() -> Vec<u8> {
        let mut img = RgbImage::from_fn(200, 200, |_, _| image::Rgb([255, 255, 255]));
        let navy = [30, 30, 120];
        draw_square(&mut img, 20, 20, 24, navy);
        draw_square(&mut img, 90, 30, 24, navy);
        draw_square(&mut img, 40, 120, 24, navy);
        draw_square(&mut img, 130, 100, 40, [180, 40, 40]);
        draw_square(&mut img, 140, 20, 30, [40, 160, 60]);
        encode_png(&img)
    }

    fn no_enhance_config() -> PipelineConfig {
        PipelineConfig {
            enhance: None,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn blank_image_reports_insufficient_candidates() {
        let img = RgbImage::from_fn(100, 100, |_, _| image::Rgb([255, 255, 255]));
        let result = process(&encode_png(&img), &no_enhance_config()).unwrap();
        assert!(result.groups.is_empty());
        assert_eq!(
            result.warnings,
            vec![BatchWarning::InsufficientCandidates { survivors: 0 }]
        );
    }

    #[test]
    fn three_survivors_skip_clustering_with_warning() {
        let mut img = RgbImage::from_fn(200, 200, |_, _| image::Rgb([255, 255, 255]));
        let navy = [30, 30, 120];
        draw_square(&mut img, 20, 20, 24, navy);
        draw_square(&mut img, 90, 30, 24, navy);
        draw_square(&mut img, 40, 120, 24, navy);
        let result = process(&encode_png(&img), &no_enhance_config()).unwrap();
        assert!(result.groups.is_empty());
        assert_eq!(
            result.warnings,
            vec![BatchWarning::InsufficientCandidates { survivors: 3 }]
        );
    }

    #[test]
    fn recurring_squares_form_a_group() {
        let result = process(&recurring_squares_png(), &no_enhance_config()).unwrap();
        assert!(
            result.warnings.is_empty(),
            "expected enough candidates, got {:?}",
            result.warnings
        );
        assert!(
            !result.groups.is_empty(),
            "expected at least one recurring group"
        );
        let largest = result.groups.iter().map(MotifGroup::weight).max().unwrap();
        assert_eq!(
            largest, 3,
            "the three identical squares should form one group"
        );
        for group in &result.groups {
            assert!(group.weight() >= cluster::MIN_GROUP_SIZE);
            assert_eq!(group.contours.len(), group.features.len());
        }
    }

    #[test]
    fn process_is_deterministic() {
        let png = recurring_squares_png();
        let config = no_enhance_config();
        let a = process(&png, &config).unwrap();
        let b = process(&png, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dimensions_are_reported() {
        let img = RgbImage::from_fn(120, 80, |_, _| image::Rgb([255, 255, 255]));
        let result = process(&encode_png(&img), &no_enhance_config()).unwrap();
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 120,
                height: 80
            }
        );
    }
}
