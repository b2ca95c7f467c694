//! # One-Shot Encoders
//!
//! Entry points for callers that want the bytes of a single primitive
//! without composing a job. Each takes the model [`Limits`] it encodes for;
//! width classes arrive as raw ordinals and are checked here.
//!
//! None of these emit `ESC @`; the output is meant to be spliced into a
//! stream the caller has already initialised.

use image::DynamicImage;

use crate::error::EncodingError;
use crate::printer::{CorrectionLevel, Limits, WidthClass};
use crate::protocol::barcode::{self, Symbology};
use crate::protocol::text::{self, FormattingState};
use crate::render::{BitmapOptions, Dithering, bitmap};

/// Text with the complete attribute set in front of it.
pub fn encode_text_print(options: &FormattingState, content: &[u8], limits: &Limits) -> Vec<u8> {
    text::encode_text(options, content, limits)
}

pub fn encode_barcode(
    symbology: Symbology,
    height: u8,
    width_class: u8,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    barcode::encode_barcode(symbology, height, WidthClass::try_from(width_class)?, payload, limits)
}

pub fn encode_qr(
    correction_level: CorrectionLevel,
    ec_level: u8,
    module_size: u8,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    barcode::encode_qr(correction_level, ec_level, module_size, payload, limits)
}

pub fn encode_pdf417(
    width_class: u8,
    columns: u8,
    security_level: u8,
    ratio: u8,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    let width = WidthClass::try_from(width_class)?;
    barcode::encode_pdf417(width, columns, security_level, ratio, payload, limits)
}

/// Bitmap with threshold dithering.
pub fn encode_bitmap(
    image: &DynamicImage,
    target_width_dots: u16,
    compression: bool,
    page_mode: bool,
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    let options = BitmapOptions {
        target_width_dots,
        compression,
        page_mode,
        dithering: Dithering::Threshold,
    };
    bitmap::transcode(image, &options, limits)
}
