//! # Rendering Module
//!
//! Image-to-raster conversion.
//!
//! ## Modules
//!
//! - [`dither`]: Luminance, threshold / Bayer / Floyd–Steinberg, bit packing
//! - [`bitmap`]: The bitmap transcoder (scale, pack, compress, page mode)

pub mod bitmap;
pub mod dither;

pub use bitmap::{BitmapOptions, MonoRaster, transcode};
pub use dither::Dithering;
