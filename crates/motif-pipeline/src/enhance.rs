//! Contrast enhancement before binarization.
//!
//! Redistributes gray values so that faint structure survives Otsu
//! thresholding. Two modes are available, selected by an explicit
//! [`EnhanceMode`] value in the pipeline configuration (never by shared
//! state): tile-based local equalization with a clip limit, or plain
//! full-image histogram equalization via
//! [`imageproc::contrast::equalize_histogram`].

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Tile grid used by local enhancement: the image is split into an
/// 8x8 grid of tiles, each equalized against its own histogram.
pub const TILE_GRID: u32 = 8;

/// Histogram clip limit for local enhancement, as a multiple of the
/// uniform bin height. Counts above the limit are redistributed evenly
/// across all bins, bounding contrast amplification in flat regions.
pub const CLIP_LIMIT: f64 = 2.0;

/// Selects how gray values are redistributed before binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnhanceMode {
    /// Clip-limited tile-based equalization (8x8 tile grid, clip
    /// limit 2.0), with bilinear blending between neighboring tile
    /// mappings. Adapts to local lighting at the cost of more work.
    #[default]
    Local,

    /// Full-image histogram equalization.
    Global,
}

/// Redistribute gray values according to the selected mode.
#[must_use = "returns the enhanced image"]
pub fn enhance(image: &GrayImage, mode: EnhanceMode) -> GrayImage {
    match mode {
        EnhanceMode::Local => equalize_tiles(image, TILE_GRID, CLIP_LIMIT),
        EnhanceMode::Global => imageproc::contrast::equalize_histogram(image),
    }
}

/// Clip-limited adaptive equalization over a tile grid.
///
/// Each tile gets its own clipped-histogram mapping; every output pixel
/// blends the mappings of the four nearest tile centers bilinearly, so
/// tile seams are invisible. Images smaller than the grid fall back to
/// fewer (at least one) tiles per axis.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn equalize_tiles(image: &GrayImage, grid: u32, clip_limit: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tiles_x = grid.min(width).max(1);
    let tiles_y = grid.min(height).max(1);

    // Proportional tile boundaries: tile t spans [t*len/tiles, (t+1)*len/tiles).
    let mut maps: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * width / tiles_x;
            let x1 = (tx + 1) * width / tiles_x;
            let y0 = ty * height / tiles_y;
            let y1 = (ty + 1) * height / tiles_y;
            maps.push(tile_mapping(image, (x0, x1), (y0, y1), clip_limit));
        }
    }

    let tile_w = f64::from(width) / f64::from(tiles_x);
    let tile_h = f64::from(height) / f64::from(tiles_y);

    GrayImage::from_fn(width, height, |x, y| {
        let v = usize::from(image.get_pixel(x, y).0[0]);

        // Continuous tile coordinate of the pixel relative to tile centers.
        let fx = (f64::from(x) + 0.5) / tile_w - 0.5;
        let fy = (f64::from(y) + 0.5) / tile_h - 0.5;
        let bx = fx.floor();
        let by = fy.floor();
        let wx = fx - bx;
        let wy = fy - by;

        let ix0 = (bx.max(0.0) as u32).min(tiles_x - 1);
        let ix1 = ((bx + 1.0).max(0.0) as u32).min(tiles_x - 1);
        let iy0 = (by.max(0.0) as u32).min(tiles_y - 1);
        let iy1 = ((by + 1.0).max(0.0) as u32).min(tiles_y - 1);

        let m00 = f64::from(maps[(iy0 * tiles_x + ix0) as usize][v]);
        let m01 = f64::from(maps[(iy0 * tiles_x + ix1) as usize][v]);
        let m10 = f64::from(maps[(iy1 * tiles_x + ix0) as usize][v]);
        let m11 = f64::from(maps[(iy1 * tiles_x + ix1) as usize][v]);

        let top = wx.mul_add(m01 - m00, m00);
        let bottom = wx.mul_add(m11 - m10, m10);
        let blended = wy.mul_add(bottom - top, top);
        image::Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clipped-histogram equalization mapping for one tile.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tile_mapping(
    image: &GrayImage,
    (x0, x1): (u32, u32),
    (y0, y1): (u32, u32),
    clip_limit: f64,
) -> [u8; 256] {
    let mut hist = [0.0_f64; 256];
    let count = f64::from((x1 - x0) * (y1 - y0));
    for y in y0..y1 {
        for x in x0..x1 {
            hist[usize::from(image.get_pixel(x, y).0[0])] += 1.0;
        }
    }

    // Clip the histogram and spread the excess evenly over all bins.
    let limit = (clip_limit * count / 256.0).max(1.0);
    let mut excess = 0.0;
    for bin in &mut hist {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bonus = excess / 256.0;

    let mut map = [0_u8; 256];
    let mut cumulative = 0.0;
    for (v, entry) in map.iter_mut().enumerate() {
        cumulative += hist[v] + bonus;
        *entry = ((cumulative / count) * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_local() {
        assert_eq!(EnhanceMode::default(), EnhanceMode::Local);
    }

    #[test]
    fn local_preserves_dimensions() {
        let img = GrayImage::new(37, 23);
        let out = enhance(&img, EnhanceMode::Local);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn global_preserves_dimensions() {
        let img = GrayImage::new(17, 31);
        let out = enhance(&img, EnhanceMode::Global);
        assert_eq!(out.dimensions(), (17, 31));
    }

    #[test]
    fn local_uniform_image_stays_uniform() {
        // Every tile sees the same flat histogram, so every pixel maps
        // through identical tables and the output is constant.
        let img = GrayImage::from_fn(64, 64, |_, _| image::Luma([128]));
        let out = enhance(&img, EnhanceMode::Local);
        let first = out.get_pixel(0, 0).0[0];
        for pixel in out.pixels() {
            assert_eq!(pixel.0[0], first);
        }
    }

    #[test]
    fn global_stretches_low_contrast_pair() {
        // Two close gray levels should be pushed apart by equalization.
        let img = GrayImage::from_fn(32, 32, |x, _| {
            if x < 16 {
                image::Luma([100])
            } else {
                image::Luma([130])
            }
        });
        let out = enhance(&img, EnhanceMode::Global);
        let low = out.get_pixel(0, 0).0[0];
        let high = out.get_pixel(31, 0).0[0];
        let in_spread = 30_i16;
        let out_spread = i16::from(high) - i16::from(low);
        assert!(
            out_spread > in_spread,
            "expected equalization to widen the gap, got {out_spread}"
        );
    }

    #[test]
    fn local_widens_faint_local_boundary() {
        let img = GrayImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                image::Luma([118])
            } else {
                image::Luma([138])
            }
        });
        let out = enhance(&img, EnhanceMode::Local);
        let low = out.get_pixel(4, 32).0[0];
        let high = out.get_pixel(60, 32).0[0];
        assert!(
            i16::from(high) - i16::from(low) > 20,
            "expected local enhancement to keep the boundary visible, got {low}..{high}"
        );
    }

    #[test]
    fn tiny_image_does_not_panic() {
        let img = GrayImage::from_fn(3, 2, |x, y| image::Luma([(x * 40 + y * 90) as u8]));
        let out = enhance(&img, EnhanceMode::Local);
        assert_eq!(out.dimensions(), (3, 2));
    }
}
