//! Otsu binarization of the enhanced grayscale image.
//!
//! Wraps [`imageproc::contrast::otsu_level`] and
//! [`imageproc::contrast::threshold`] to reduce the enhanced image to
//! exactly two levels (0 and 255) before contour extraction. The
//! threshold is chosen per image; the pipeline never hard-codes one.

use image::GrayImage;
use imageproc::contrast::ThresholdType;

/// Threshold an image at its Otsu level.
///
/// Returns a binary image containing only the values 0 and 255.
/// Pixels strictly above the Otsu level become white.
#[must_use = "returns the binarized image"]
pub fn otsu_binarize(image: &GrayImage) -> GrayImage {
    let level = imageproc::contrast::otsu_level(image);
    imageproc::contrast::threshold(image, level, ThresholdType::Binary)
}
