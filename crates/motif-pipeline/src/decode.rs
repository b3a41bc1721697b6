//! Image decoding and channel preparation.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces both the
//! color image (feature sampling) and its grayscale reduction (contour
//! extraction). This is the first step in the pipeline: raw bytes in,
//! raster images out.

use image::{GrayImage, RgbImage};

use crate::types::PipelineError;

/// Decode raw image bytes into a color image and its grayscale
/// reduction.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image`
/// crate can decode). The standard luminance formula is used for
/// RGB-to-gray conversion.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<(RgbImage, GrayImage), PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok((img.to_rgb8(), img.to_luma8()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

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

    #[test]
    fn empty_input_returns_error() {
        let result = decode_image(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_image(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn valid_png_decodes_both_channels() {
        let img = RgbImage::from_fn(4, 3, |_, _| image::Rgb([200, 100, 50]));
        let (color, gray) = decode_image(&encode_png(&img)).unwrap();
        assert_eq!(color.dimensions(), (4, 3));
        assert_eq!(gray.dimensions(), (4, 3));
        assert_eq!(color.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn grayscale_uses_weighted_luminance() {
        let green = RgbImage::from_fn(1, 1, |_, _| image::Rgb([0, 255, 0]));
        let blue = RgbImage::from_fn(1, 1, |_, _| image::Rgb([0, 0, 255]));
        let g = decode_image(&encode_png(&green)).unwrap().1.get_pixel(0, 0).0[0];
        let b = decode_image(&encode_png(&blue)).unwrap().1.get_pixel(0, 0).0[0];
        assert!(
            g > b,
            "green luminance should exceed blue, got G={g} B={b}"
        );
    }
}
