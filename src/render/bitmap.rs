//! # Bitmap Transcoder
//!
//! Turns an image into raster commands the printer can print.
//!
//! ## Pipeline
//!
//! ```text
//! DynamicImage
//!   │ scale down to min(target width, model width), keep aspect ratio
//!   ▼
//! RGBA ── composite on white, (r+g+b)/3 ──► Gray
//!   │ threshold / dither
//!   ▼
//! packed 1-bit rows (MSB first)
//!   │ split into bands of `max_band_rows`
//!   ▼
//! GS v 0 (raw) or GS v 1 (PackBits) per band
//!   │ optional
//!   ▼
//! ESC L / ESC W ... ESC FF / ESC S (page mode)
//! ```
//!
//! Images are only ever scaled down. Nearest-neighbour sampling keeps hard
//! black/white edges (barcodes in screenshots, signatures) crisp.

use image::DynamicImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::dither::{self, Dithering};
use crate::error::EncodingError;
use crate::printer::Limits;
use crate::protocol::{graphics, page};

/// Options for one bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitmapOptions {
    /// Desired width in dots; clipped to the model width
    pub target_width_dots: u16,
    /// Use the PackBits raster command
    pub compression: bool,
    /// Wrap the raster in page mode
    pub page_mode: bool,
    pub dithering: Dithering,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self {
            target_width_dots: u16::MAX,
            compression: false,
            page_mode: false,
            dithering: Dithering::Threshold,
        }
    }
}

/// A packed monochrome image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoRaster {
    /// Width in dots
    pub width: u16,
    /// Height in dots
    pub height: u16,
    /// `width_bytes() * height` bytes, row-major, MSB = leftmost
    pub data: Vec<u8>,
}

impl MonoRaster {
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width.div_ceil(8)
    }

    /// Emit raster commands, one per band of at most `band_rows` rows.
    pub fn to_commands(
        &self,
        compression: bool,
        band_rows: u16,
    ) -> Result<Vec<u8>, EncodingError> {
        let width_bytes = self.width_bytes();
        let rows_per_band = band_rows.max(1) as usize;
        let mut out = Vec::with_capacity(self.data.len() + 16);

        for band in self.data.chunks(width_bytes as usize * rows_per_band) {
            let rows = (band.len() / width_bytes as usize) as u16;
            let cmd = if compression {
                graphics::compressed_raster(width_bytes, rows, band)?
            } else {
                graphics::raster(width_bytes, rows, band)?
            };
            out.extend(cmd);
        }
        Ok(out)
    }
}

/// Width the image will have after step 1 of the pipeline.
fn fitted_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let new_height = (height as u64 * max_width as u64 / width as u64).max(1) as u32;
    (max_width, new_height)
}

/// Scale, convert, and pack an image without emitting commands.
///
/// ## Errors
///
/// - [`EncodingError::EmptyImage`] for a 0-pixel image
/// - [`EncodingError::ImageTooWide`] if the target width is 0
/// - [`EncodingError::ImageTooTall`] if the scaled height exceeds 65535 dots
pub fn rasterize(
    image: &DynamicImage,
    options: &BitmapOptions,
    limits: &Limits,
) -> Result<MonoRaster, EncodingError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncodingError::EmptyImage);
    }

    let max_width = options.target_width_dots.min(limits.max_dot_width) as u32;
    if max_width == 0 {
        return Err(EncodingError::ImageTooWide {
            width,
            max: limits.max_dot_width,
        });
    }

    let (new_width, new_height) = fitted_size(width, height, max_width);
    if new_width > limits.max_dot_width as u32 {
        return Err(EncodingError::ImageTooWide {
            width: new_width,
            max: limits.max_dot_width,
        });
    }
    if new_height > u16::MAX as u32 {
        return Err(EncodingError::ImageTooTall { height: new_height });
    }

    let rgba = if (new_width, new_height) == (width, height) {
        image.to_rgba8()
    } else {
        image
            .resize_exact(new_width, new_height, FilterType::Nearest)
            .to_rgba8()
    };

    let gray = dither::to_luma(&rgba);
    let data = dither::to_raster(&gray, options.dithering);

    Ok(MonoRaster {
        width: new_width as u16,
        height: new_height as u16,
        data,
    })
}

/// # Transcode an Image
///
/// Runs the whole pipeline and returns printer commands.
///
/// ## Example
///
/// ```
/// use estrellita::printer::Limits;
/// use estrellita::render::bitmap::{transcode, BitmapOptions};
/// use image::{DynamicImage, GrayImage, Luma};
///
/// let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 2, Luma([0])));
/// let bytes = transcode(&img, &BitmapOptions::default(), &Limits::default()).unwrap();
/// assert_eq!(&bytes[..8], &[0x1D, 0x76, 0x00, 0x00, 2, 0, 2, 0]);
/// assert_eq!(&bytes[8..], &[0xFF; 4]);
/// ```
pub fn transcode(
    image: &DynamicImage,
    options: &BitmapOptions,
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    let raster = rasterize(image, options, limits)?;
    let body = raster.to_commands(options.compression, limits.max_band_rows)?;

    if options.page_mode {
        Ok(page::wrap(
            raster.width_bytes() * 8,
            raster.height,
            &body,
        ))
    } else {
        Ok(body)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([if (x / 4 + y / 4) % 2 == 0 { 0 } else { 255 }])
        }))
    }

    #[test]
    fn test_fitted_size_keeps_aspect() {
        assert_eq!(fitted_size(1152, 400, 576), (576, 200));
        assert_eq!(fitted_size(300, 100, 576), (300, 100));
        assert_eq!(fitted_size(5000, 1, 384), (384, 1));
    }

    #[test]
    fn test_scales_to_model_width() {
        let img = checker(1000, 500);
        let raster = rasterize(&img, &BitmapOptions::default(), &Limits::PORTABLE_2INCH).unwrap();
        assert_eq!(raster.width, 384);
        assert_eq!(raster.height, 192);
        assert_eq!(raster.data.len(), 48 * 192);
    }

    #[test]
    fn test_target_width_smaller_than_model() {
        let img = checker(400, 100);
        let options = BitmapOptions {
            target_width_dots: 200,
            ..Default::default()
        };
        let raster = rasterize(&img, &options, &Limits::PORTABLE_3INCH).unwrap();
        assert_eq!((raster.width, raster.height), (200, 50));
    }

    #[test]
    fn test_never_upscales() {
        let img = checker(20, 10);
        let raster = rasterize(&img, &BitmapOptions::default(), &Limits::PORTABLE_4INCH).unwrap();
        assert_eq!((raster.width, raster.height), (20, 10));
        assert_eq!(raster.width_bytes(), 3);
    }

    #[test]
    fn test_empty_and_zero_target() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 5));
        assert_eq!(
            rasterize(&empty, &BitmapOptions::default(), &Limits::default()),
            Err(EncodingError::EmptyImage)
        );

        let options = BitmapOptions {
            target_width_dots: 0,
            ..Default::default()
        };
        assert_eq!(
            rasterize(&checker(8, 8), &options, &Limits::default()),
            Err(EncodingError::ImageTooWide { width: 8, max: 576 })
        );
    }

    #[test]
    fn test_transparent_prints_nothing() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 0])));
        let raster = rasterize(&img, &BitmapOptions::default(), &Limits::default()).unwrap();
        assert_eq!(raster.data, vec![0]);
    }

    #[test]
    fn test_bands_split_tall_images() {
        let img = checker(64, 600);
        let limits = Limits::default();
        let bytes = transcode(&img, &BitmapOptions::default(), &limits).unwrap();
        let headers: Vec<usize> = bytes
            .windows(3)
            .enumerate()
            .filter(|(_, w)| *w == [0x1D, 0x76, 0x00])
            .map(|(i, _)| i)
            .collect();
        // 256 + 256 + 88 rows
        assert_eq!(headers.len(), 3);
        assert_eq!(bytes.len(), 3 * 8 + 8 * 600);
        let last = headers[2];
        assert_eq!(&bytes[last + 6..last + 8], &[88, 0]);
    }

    #[test]
    fn test_page_mode_wraps() {
        let img = checker(16, 8);
        let options = BitmapOptions {
            page_mode: true,
            ..Default::default()
        };
        let bytes = transcode(&img, &options, &Limits::default()).unwrap();
        assert_eq!(&bytes[..2], &[0x1B, 0x4C]);
        assert_eq!(&bytes[2..12], &[0x1B, 0x57, 0, 0, 0, 0, 16, 0, 48, 0]);
        assert!(bytes.ends_with(&[0x1B, 0x0C, 0x1B, 0x53]));
    }

    #[test]
    fn test_idempotent_on_conforming_bw() {
        let img = checker(128, 40);
        let options = BitmapOptions {
            compression: true,
            ..Default::default()
        };
        let first = transcode(&img, &options, &Limits::default()).unwrap();
        let second = transcode(&img, &options, &Limits::default()).unwrap();
        assert_eq!(first, second);
    }
}
