//! # Printer Geometry and Limits
//!
//! Static per-model constraints used by every encoder before it emits a byte.
//!
//! ## Supported Models
//!
//! | Model class | Paper | Width (dots) | Cutter | Drawer |
//! |-------------|-------|--------------|--------|--------|
//! | 2-inch portable (SM-S220i) | 58mm | 384 | no | no |
//! | 3-inch portable (SM-T300i) | 80mm | 576 | no | no |
//! | 4-inch portable (SM-T400i) | 112mm | 832 | no | no |
//! | 80mm POS (TSP650II) | 80mm | 576 | yes | yes |
//!
//! All models print at 203 DPI (8 dots/mm).
//!
//! ## Usage
//!
//! ```
//! use estrellita::printer::limits_for;
//!
//! let limits = limits_for("3inch").unwrap();
//! assert_eq!(limits.max_dot_width, 576);
//! assert_eq!(limits.width_bytes(), 72);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

// ============================================================================
// WIDTH CLASSES
// ============================================================================

/// Barcode / PDF417 module width class.
///
/// Eight discrete steps. The variant name is the narrow module width in
/// thousandths of a millimetre, so `W125` is 0.125mm and `W1000` is 1.0mm.
/// The device receives the ordinal (0..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WidthClass {
    W125 = 0,
    W250 = 1,
    W375 = 2,
    W500 = 3,
    W625 = 4,
    W750 = 5,
    W875 = 6,
    W1000 = 7,
}

impl WidthClass {
    /// Every class, in ordinal order.
    pub const ALL: [WidthClass; 8] = [
        Self::W125,
        Self::W250,
        Self::W375,
        Self::W500,
        Self::W625,
        Self::W750,
        Self::W875,
        Self::W1000,
    ];

    /// The byte sent to the device.
    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Narrow module width in millimetres.
    pub fn module_mm(self) -> f32 {
        (self.ordinal() as f32 + 1.0) * 0.125
    }
}

impl TryFrom<u8> for WidthClass {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(EncodingError::InvalidWidthClass(value))
    }
}

impl From<WidthClass> for u8 {
    fn from(value: WidthClass) -> Self {
        value.ordinal()
    }
}

// ============================================================================
// QR CORRECTION LEVELS
// ============================================================================

/// QR error-correction level.
///
/// | Level | Recovery |
/// |-------|----------|
/// | L | ~7% |
/// | M | ~15% |
/// | Q | ~25% |
/// | H | ~30% |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CorrectionLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl CorrectionLevel {
    /// ASCII letter the device expects in the QR setup command.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Self::L => b'L',
            Self::M => b'M',
            Self::Q => b'Q',
            Self::H => b'H',
        }
    }
}

impl FromStr for CorrectionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            other => Err(format!("unknown correction level '{}' (L, M, Q, H)", other)),
        }
    }
}

// ============================================================================
// MODEL CLASSES
// ============================================================================

/// A family of printers sharing one set of limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    /// 2-inch portable (58mm paper)
    Portable2Inch,
    /// 3-inch portable (80mm paper)
    Portable3Inch,
    /// 4-inch portable (112mm paper)
    Portable4Inch,
    /// 80mm desktop POS printer in ESC/POS mode
    Pos80,
}

impl ModelClass {
    pub const ALL: [ModelClass; 4] = [
        Self::Portable2Inch,
        Self::Portable3Inch,
        Self::Portable4Inch,
        Self::Pos80,
    ];

    /// Look up the limits for this class.
    pub const fn limits(self) -> Limits {
        match self {
            Self::Portable2Inch => Limits::PORTABLE_2INCH,
            Self::Portable3Inch => Limits::PORTABLE_3INCH,
            Self::Portable4Inch => Limits::PORTABLE_4INCH,
            Self::Pos80 => Limits::POS_80,
        }
    }

    /// Names accepted by [`FromStr`], first one is canonical.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Portable2Inch => &["2inch", "58mm", "sm-s220i", "sm-s210i", "sm-s230i"],
            Self::Portable3Inch => &["3inch", "80mm-portable", "sm-t300i", "sm-t300"],
            Self::Portable4Inch => &["4inch", "112mm", "sm-t400i"],
            Self::Pos80 => &["pos80", "80mm", "tsp650ii", "tsp650"],
        }
    }
}

impl FromStr for ModelClass {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.aliases().contains(&needle.as_str()))
            .ok_or_else(|| EncodingError::UnsupportedModel(s.to_string()))
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aliases()[0])
    }
}

// ============================================================================
// LIMITS
// ============================================================================

/// # Device Limits
///
/// Hardware constraints the encoders validate against.
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// 3-inch portable:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   width_mm = 576 / 8 = 72mm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Human-readable model name
    pub name: &'static str,

    /// Maximum printable width in dots
    pub max_dot_width: u16,

    /// Barcode / PDF417 width classes the firmware accepts
    pub supported_width_classes: &'static [WidthClass],

    /// QR correction levels the firmware accepts
    pub supported_correction_levels: &'static [CorrectionLevel],

    /// Largest character magnification step
    pub max_text_scale: u8,

    /// Largest QR module size in dots
    pub max_qr_module_size: u8,

    /// Rows per raster command before a new band is started
    pub max_band_rows: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Whether the model has an auto-cutter
    pub has_cutter: bool,

    /// Whether the model drives a cash drawer
    pub has_drawer: bool,
}

const ALL_CORRECTION_LEVELS: &[CorrectionLevel] = &[
    CorrectionLevel::L,
    CorrectionLevel::M,
    CorrectionLevel::Q,
    CorrectionLevel::H,
];

impl Limits {
    pub const PORTABLE_2INCH: Self = Self {
        name: "2-inch portable",
        max_dot_width: 384,
        supported_width_classes: &WidthClass::ALL,
        supported_correction_levels: ALL_CORRECTION_LEVELS,
        max_text_scale: 8,
        max_qr_module_size: 8,
        max_band_rows: 256,
        dpi: 203,
        has_cutter: false,
        has_drawer: false,
    };

    pub const PORTABLE_3INCH: Self = Self {
        name: "3-inch portable",
        max_dot_width: 576,
        ..Self::PORTABLE_2INCH
    };

    pub const PORTABLE_4INCH: Self = Self {
        name: "4-inch portable",
        max_dot_width: 832,
        ..Self::PORTABLE_2INCH
    };

    pub const POS_80: Self = Self {
        name: "80mm POS",
        max_dot_width: 576,
        has_cutter: true,
        has_drawer: true,
        ..Self::PORTABLE_2INCH
    };

    /// Printable width in bytes (one bit per dot)
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.max_dot_width.div_ceil(8)
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> u16 {
        (mm * self.dots_per_mm()).round() as u16
    }

    /// Check a width class against this model.
    pub fn check_width_class(&self, class: WidthClass) -> Result<(), EncodingError> {
        if self.supported_width_classes.contains(&class) {
            Ok(())
        } else {
            Err(EncodingError::InvalidWidthClass(class.ordinal()))
        }
    }

    /// Check a QR correction level against this model.
    pub fn check_correction_level(&self, level: CorrectionLevel) -> Result<(), EncodingError> {
        if self.supported_correction_levels.contains(&level) {
            Ok(())
        } else {
            Err(EncodingError::UnsupportedCorrectionLevel(
                level.code() as char,
                self.name,
            ))
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::PORTABLE_3INCH
    }
}

/// Look up limits by model name or alias (case-insensitive).
///
/// ## Errors
///
/// [`EncodingError::UnsupportedModel`] if no class matches.
pub fn limits_for(model: &str) -> Result<Limits, EncodingError> {
    model.parse::<ModelClass>().map(ModelClass::limits)
}

// ============================================================================
// TESTS
// ============================================================================
