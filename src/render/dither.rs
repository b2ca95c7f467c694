//! # Monochrome Conversion
//!
//! Thermal heads print black or nothing, so every image is reduced to one
//! bit per dot before it becomes a raster command.
//!
//! ## Methods
//!
//! | Method | Rule | Use |
//! |--------|------|-----|
//! | [`Dithering::Threshold`] | luminance < 127 prints | logos, signatures, text scans (default) |
//! | [`Dithering::Bayer`] | 8x8 ordered matrix | photos, gradients |
//! | [`Dithering::FloydSteinberg`] | error diffusion | photos where detail matters |
//!
//! Threshold output is stable: feeding an already black-and-white image
//! through it again gives the same dots.
//!
//! ## Luminance
//!
//! Transparent pixels are composited onto white paper first, then
//!
//! ```text
//! luminance = (r + g + b) / 3
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use estrellita::render::dither;
//!
//! let row: Vec<bool> = vec![true, true, false, false, true, false, true, false];
//! assert_eq!(dither::pack_row(&row), vec![0b11001010]);
//! ```

use std::str::FromStr;

use image::{GrayImage, Luma, Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Luminance below this prints a dot.
pub const MIDPOINT: u8 = 127;

/// How grey levels become dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dithering {
    #[default]
    Threshold,
    Bayer,
    FloydSteinberg,
}

impl FromStr for Dithering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" | "none" => Ok(Self::Threshold),
            "bayer" | "ordered" => Ok(Self::Bayer),
            "floyd-steinberg" | "floyd_steinberg" | "fs" => Ok(Self::FloydSteinberg),
            other => Err(format!(
                "unknown dithering '{}' (threshold, bayer, floyd-steinberg)",
                other
            )),
        }
    }
}

// ============================================================================
// LUMINANCE
// ============================================================================

/// Average of the channels after compositing onto white.
#[inline]
pub fn luminance(pixel: Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0;
    let a = a as u32;
    let over_white = |c: u8| (c as u32 * a + 255 * (255 - a)) / 255;
    ((over_white(r) + over_white(g) + over_white(b)) / 3) as u8
}

/// Grey image of [`luminance`] values.
pub fn to_luma(image: &RgbaImage) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        out.put_pixel(x, y, Luma([luminance(*pixel)]));
    }
    out
}

// ============================================================================
// BAYER 8x8
// ============================================================================

/// Bayer 8x8 dithering matrix
///
/// Values range from 0-63; low values switch on first as darkness rises.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Ordered-dither threshold for a position, in (0, 1).
///
/// ```text
/// threshold = (BAYER8[y mod 8][x mod 8] + 0.5) / 64
/// ```
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0
}

/// Whether a dot with darkness `intensity` (0.0 white, 1.0 black) prints.
#[inline]
pub fn should_print(x: usize, y: usize, intensity: f32) -> bool {
    intensity > threshold(x, y)
}

// ============================================================================
// PACKING
// ============================================================================

/// Pack a row of dots into bytes, MSB = leftmost, zero-padded on the right.
///
/// ```
/// use estrellita::render::dither::pack_row;
///
/// assert_eq!(pack_row(&[true; 12]), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}

// ============================================================================
// RASTERIZATION
// ============================================================================

/// Convert a grey image to packed 1-bit rows.
///
/// Length of the result is `ceil(width / 8) * height`.
pub fn to_raster(gray: &GrayImage, method: Dithering) -> Vec<u8> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let width_bytes = width.div_ceil(8);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    if method == Dithering::FloydSteinberg {
        return floyd_steinberg(gray);
    }

    let mut data = vec![0u8; width_bytes * height];
    data.par_chunks_mut(width_bytes)
        .enumerate()
        .for_each(|(y, out)| {
            let row: Vec<bool> = (0..width)
                .map(|x| {
                    let lum = gray.get_pixel(x as u32, y as u32).0[0];
                    match method {
                        Dithering::Bayer => should_print(x, y, 1.0 - lum as f32 / 255.0),
                        _ => lum < MIDPOINT,
                    }
                })
                .collect();
            out.copy_from_slice(&pack_row(&row));
        });
    data
}

/// Serpentine Floyd–Steinberg error diffusion.
fn floyd_steinberg(gray: &GrayImage) -> Vec<u8> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let mut levels: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32).collect();
    let mut data = Vec::with_capacity(width.div_ceil(8) * height);

    for y in 0..height {
        let mut row = vec![false; width];
        let left_to_right = y % 2 == 0;
        for step in 0..width {
            let x = if left_to_right { step } else { width - 1 - step };
            let old = levels[y * width + x];
            let black = old < MIDPOINT as f32;
            row[x] = black;
            let error = old - if black { 0.0 } else { 255.0 };

            let forward: isize = if left_to_right { 1 } else { -1 };
            let mut spread = |dx: isize, dy: usize, weight: f32| {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx >= 0 && (nx as usize) < width && ny < height {
                    levels[ny * width + nx as usize] += error * weight;
                }
            };
            spread(forward, 0, 7.0 / 16.0);
            spread(-forward, 1, 3.0 / 16.0);
            spread(0, 1, 5.0 / 16.0);
            spread(forward, 1, 1.0 / 16.0);
        }
        data.extend(pack_row(&row));
    }
    data
}

// ============================================================================
// TESTS
// ============================================================================
