//! Image normalization: canonical color encoding and bounded dimensions.
//!
//! Caption backends expect one predictable input shape. This stage converts
//! whatever the decoder produced (grayscale, RGBA, 16-bit) to 8-bit RGB and
//! shrinks oversized images so neither side exceeds the configured maximum,
//! preserving aspect ratio. Lanczos3 is used for downsampling; it is the
//! slowest filter the `image` crate offers and the only one that keeps
//! edges crisp enough at 2–4× reductions.
//!
//! Deterministic: the same decoded image and the same `max_dimension`
//! always produce the same output dimensions. Images already within bounds
//! are converted (if needed) but never resampled, and nothing is ever
//! upscaled.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tracing::debug;

/// A decoded image in canonical form: 8-bit RGB, both dimensions within the
/// configured bound. Consumed by the captioner, then discarded.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    rgb: RgbImage,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// The underlying RGB pixel buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }
}

/// Normalize a decoded image: RGB8 encoding, dimensions ≤ `max_dimension`.
pub fn normalize(img: DynamicImage, max_dimension: u32) -> NormalizedImage {
    let (w, h) = (img.width(), img.height());

    let resized = if w > max_dimension || h > max_dimension {
        // `resize` fits within the bounding square and preserves aspect
        // ratio; e.g. 2000×1000 with max 1024 → 1024×512.
        let out = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        debug!(
            "Resized {}x{} → {}x{} (max {})",
            w,
            h,
            out.width(),
            out.height(),
            max_dimension
        );
        out
    } else {
        img
    };

    NormalizedImage {
        rgb: resized.into_rgb8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn rgb_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30])))
    }

    #[test]
    fn landscape_is_bounded_with_aspect_preserved() {
        let out = normalize(rgb_image(2000, 1000), 1024);
        assert_eq!((out.width(), out.height()), (1024, 512));
    }

    #[test]
    fn portrait_is_bounded_with_aspect_preserved() {
        let out = normalize(rgb_image(1000, 2000), 1024);
        assert_eq!((out.width(), out.height()), (512, 1024));
    }

    #[test]
    fn square_over_limit_shrinks_to_limit() {
        let out = normalize(rgb_image(4096, 4096), 1024);
        assert_eq!((out.width(), out.height()), (1024, 1024));
    }

    #[test]
    fn within_bounds_is_untouched() {
        let out = normalize(rgb_image(800, 600), 1024);
        assert_eq!((out.width(), out.height()), (800, 600));
    }

    #[test]
    fn never_upscales() {
        let out = normalize(rgb_image(32, 16), 1024);
        assert_eq!((out.width(), out.height()), (32, 16));
    }

    #[test]
    fn rgba_converts_to_three_channels() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([255, 0, 0, 128]),
        ));
        let out = normalize(img, 1024);
        // RgbImage has exactly three channels per pixel by construction.
        assert_eq!(out.as_rgb().as_raw().len(), 8 * 8 * 3);
    }

    #[test]
    fn grayscale_converts_to_three_channels() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 4, Luma([77])));
        let out = normalize(img, 1024);
        assert_eq!(out.as_rgb().as_raw().len(), 6 * 4 * 3);
        // Gray expands to equal channels.
        let px = out.as_rgb().get_pixel(0, 0);
        assert_eq!(px.0, [77, 77, 77]);
    }

    #[test]
    fn deterministic_for_same_input() {
        let a = normalize(rgb_image(3000, 1234), 1024);
        let b = normalize(rgb_image(3000, 1234), 1024);
        assert_eq!((a.width(), a.height()), (b.width(), b.height()));
        assert_eq!(a.as_rgb().as_raw(), b.as_rgb().as_raw());
    }
}
