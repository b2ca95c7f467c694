//! # Barcode Commands
//!
//! Linear barcodes, QR codes, and PDF417 codes. The device renders the
//! symbol itself; the host only sends parameters and payload.
//!
//! ## Supported Symbols
//!
//! | Symbol | Setup | Length field |
//! |--------|-------|--------------|
//! | Code39 / Code93 / ITF / Code128 | `GS h`, `GS w` | 8-bit (in `GS k`) |
//! | QR | `GS Z 2`, `ESC Z v ec k` | 32-bit LE |
//! | PDF417 | `GS w`, `GS Z 0`, `ESC Z c s r` | 8-bit |
//!
//! Every encoder validates first and returns an error without emitting
//! anything, so a rejected symbol never leaves a half-written command in
//! a job.
//!
//! ## Example
//!
//! ```
//! use estrellita::printer::{Limits, WidthClass, CorrectionLevel};
//! use estrellita::protocol::barcode::{self, Symbology};
//!
//! let limits = Limits::default();
//! let mut data = Vec::new();
//! data.extend(barcode::encode_barcode(Symbology::Code39, 80, WidthClass::W250, b"12345678", &limits)?);
//! data.extend(barcode::encode_qr(CorrectionLevel::M, 0, 4, b"https://example.com", &limits)?);
//! # Ok::<(), estrellita::error::EncodingError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS, u32_le};
use crate::error::EncodingError;
use crate::printer::{CorrectionLevel, Limits, WidthClass};

// ============================================================================
// LENGTH FIELDS
// ============================================================================

/// Width of the length prefix in front of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    U8,
    U32,
}

impl LengthField {
    /// Largest payload length the field can describe.
    pub fn max_len(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }

    /// Number of bytes the field occupies.
    pub fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U32 => 4,
        }
    }

    fn check(self, kind: &'static str, len: usize) -> Result<(), EncodingError> {
        if len > self.max_len() {
            return Err(EncodingError::PayloadTooLarge {
                kind,
                len,
                max: self.max_len(),
            });
        }
        Ok(())
    }

    /// Append the length prefix. Caller must have called `check` first.
    fn write(self, len: usize, out: &mut Vec<u8>) {
        match self {
            Self::U8 => out.push(len as u8),
            Self::U32 => out.extend(u32_le(len as u32)),
        }
    }
}

// ============================================================================
// 1D BARCODES (GS k)
// ============================================================================

/// Linear barcode symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    Code39,
    Code93,
    Itf,
    Code128,
}

impl Symbology {
    pub const ALL: [Symbology; 4] = [Self::Code39, Self::Code93, Self::Itf, Self::Code128];

    /// `m` byte of `GS k m n d1..dn`.
    ///
    /// | Symbology | m |
    /// |-----------|---|
    /// | Code39 | 69 |
    /// | ITF | 70 |
    /// | Code93 | 72 |
    /// | Code128 | 73 |
    pub fn type_code(self) -> u8 {
        match self {
            Self::Code39 => 69,
            Self::Itf => 70,
            Self::Code93 => 72,
            Self::Code128 => 73,
        }
    }

    /// Reverse of [`Self::type_code`].
    pub fn from_type_code(m: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.type_code() == m)
    }

    /// Length prefix the device expects for this symbology.
    pub fn length_field(self) -> LengthField {
        match self {
            Self::Code39 | Self::Code93 | Self::Itf | Self::Code128 => LengthField::U8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Code39 => "Code39",
            Self::Code93 => "Code93",
            Self::Itf => "ITF",
            Self::Code128 => "Code128",
        }
    }
}

/// Set barcode height in dots (GS h n)
#[inline]
pub fn set_height(dots: u8) -> Vec<u8> {
    vec![GS, b'h', dots.max(1)]
}

/// Set module width class (GS w n)
///
/// The device receives the class ordinal.
#[inline]
pub fn set_width(class: WidthClass) -> Vec<u8> {
    vec![GS, b'w', class.ordinal()]
}

/// # Encode a Linear Barcode
///
/// ## Protocol Details
///
/// | Step | ASCII | Hex |
/// |------|-------|-----|
/// | Height | GS h n | 1D 68 n |
/// | Width | GS w n | 1D 77 n |
/// | Print | GS k m n d1..dn | 1D 6B m n ... |
///
/// ## Errors
///
/// - [`EncodingError::InvalidWidthClass`] if `width` is not supported by the model
/// - [`EncodingError::PayloadTooLarge`] if the payload exceeds 255 bytes
pub fn encode_barcode(
    symbology: Symbology,
    height: u8,
    width: WidthClass,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    limits.check_width_class(width)?;
    let field = symbology.length_field();
    field.check(symbology.name(), payload.len())?;

    let mut out = Vec::with_capacity(9 + payload.len());
    out.extend(set_height(height));
    out.extend(set_width(width));
    out.extend([GS, b'k', symbology.type_code()]);
    field.write(payload.len(), &mut out);
    out.extend_from_slice(payload);
    Ok(out)
}

// ============================================================================
// QR CODES
// ============================================================================

/// Largest QR version (symbol size). 0 lets the firmware pick.
pub const QR_MAX_VERSION: u8 = 40;

/// # Encode a QR Code
///
/// ## Protocol Details
///
/// | Step | ASCII | Hex |
/// |------|-------|-----|
/// | Select QR | GS Z 2 | 1D 5A 02 |
/// | Setup + print | ESC Z v ec k len(4) data | 1B 5A v ec k ... |
///
/// - `v`: version / size-by-EC-level, 0..=40 (0 = auto), clamped
/// - `ec`: `'L'`, `'M'`, `'Q'`, `'H'`
/// - `k`: module size in dots, clamped to 1..=`max_qr_module_size`
///
/// ## Example
///
/// ```
/// use estrellita::printer::{CorrectionLevel, Limits};
/// use estrellita::protocol::barcode::encode_qr;
///
/// let bytes = encode_qr(CorrectionLevel::M, 0, 4, b"0123456789ABCDEF", &Limits::default()).unwrap();
/// assert_eq!(&bytes[8..12], &[16, 0, 0, 0]);
/// assert_eq!(&bytes[12..], b"0123456789ABCDEF");
/// ```
pub fn encode_qr(
    level: CorrectionLevel,
    version: u8,
    module_size: u8,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    limits.check_correction_level(level)?;
    let field = LengthField::U32;
    field.check("QR", payload.len())?;

    let version = version.min(QR_MAX_VERSION);
    let module_size = module_size.clamp(1, limits.max_qr_module_size.max(1));

    let mut out = Vec::with_capacity(10 + payload.len());
    out.extend([GS, b'Z', 2]);
    out.extend([ESC, b'Z', version, level.code(), module_size]);
    field.write(payload.len(), &mut out);
    out.extend_from_slice(payload);
    Ok(out)
}

// ============================================================================
// PDF417
// ============================================================================

/// # Encode a PDF417 Code
///
/// ## Protocol Details
///
/// | Step | ASCII | Hex |
/// |------|-------|-----|
/// | Module width | GS w n | 1D 77 n |
/// | Select PDF417 | GS Z 0 | 1D 5A 00 |
/// | Setup + print | ESC Z c s r len(1) data | 1B 5A c s r ... |
///
/// - `c`: data columns 1..=30
/// - `s`: security (error correction) level 0..=8
/// - `r`: module height/width ratio 2..=5
///
/// All three are clamped.
///
/// ## Errors
///
/// [`EncodingError::PayloadTooLarge`] above 255 bytes; larger payloads must
/// be split upstream.
pub fn encode_pdf417(
    width: WidthClass,
    columns: u8,
    security: u8,
    ratio: u8,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    limits.check_width_class(width)?;
    let field = LengthField::U8;
    field.check("PDF417", payload.len())?;

    let mut out = Vec::with_capacity(12 + payload.len());
    out.extend(set_width(width));
    out.extend([GS, b'Z', 0]);
    out.extend([
        ESC,
        b'Z',
        columns.clamp(1, 30),
        security.min(8),
        ratio.clamp(2, 5),
    ]);
    field.write(payload.len(), &mut out);
    out.extend_from_slice(payload);
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
