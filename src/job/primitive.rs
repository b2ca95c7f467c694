//! # Print Primitives
//!
//! The closed set of things a job can contain. Every variant has exactly one
//! encoder; the composer matches exhaustively, so adding a variant without an
//! encoder does not compile.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;
use crate::printer::{CorrectionLevel, WidthClass};
use crate::protocol::barcode::Symbology;
use crate::protocol::codepage;
use crate::protocol::text::{DoubleByteCharset, FormattingState};
use crate::render::BitmapOptions;

/// One atomic print instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintPrimitive {
    /// Single-byte text, already in the printer's code page
    Text {
        content: Vec<u8>,
        format: FormattingState,
    },

    /// East-Asian text, transcoded at encode time
    DoubleByteText {
        content: String,
        charset: DoubleByteCharset,
        format: FormattingState,
    },

    Barcode {
        symbology: Symbology,
        /// Bar height in dots
        height: u8,
        width: WidthClass,
        payload: Vec<u8>,
    },

    QrCode {
        correction_level: CorrectionLevel,
        /// Module size in dots
        module_size: u8,
        /// Symbol version, 0 = smallest that fits
        size_by_ec_level: u8,
        payload: Vec<u8>,
    },

    Pdf417 {
        width: WidthClass,
        columns: u8,
        security_level: u8,
        ratio: u8,
        payload: Vec<u8>,
    },

    Bitmap {
        image: DynamicImage,
        options: BitmapOptions,
    },
}

impl PrintPrimitive {
    /// Text already in the printer's code page.
    pub fn text(content: impl Into<Vec<u8>>, format: FormattingState) -> Self {
        Self::Text {
            content: content.into(),
            format,
        }
    }

    /// Unicode text, transcoded to PC437.
    pub fn text_from_str(content: &str, format: FormattingState) -> Result<Self, EncodingError> {
        Ok(Self::Text {
            content: codepage::encode(content)?,
            format,
        })
    }

    /// Short name for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::DoubleByteText { .. } => "double_byte_text",
            Self::Barcode { .. } => "barcode",
            Self::QrCode { .. } => "qr_code",
            Self::Pdf417 { .. } => "pdf417",
            Self::Bitmap { .. } => "bitmap",
        }
    }
}

/// Commands appended after the last primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrailingAction {
    /// Feed `lines` text lines
    Feed { lines: u8 },
    /// Feed `dots` motion units
    FeedDots { dots: u8 },
    /// Cut the paper (POS models only)
    Cut {
        #[serde(default)]
        partial: bool,
    },
    /// Pulse the cash drawer (POS models only)
    OpenDrawer,
}

/// # Print Job
///
/// A composed, immutable byte stream ready for one transport session.
/// Only [`crate::job::compose`] builds one; [`crate::print::print_job`]
/// consumes it. Not `Clone`, so one job prints at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PrintJob {
    bytes: Vec<u8>,
    primitives: usize,
}

impl PrintJob {
    pub(crate) fn new(bytes: Vec<u8>, primitives: usize) -> Self {
        Self { bytes, primitives }
    }

    /// Encoded command stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of primitives the job was composed from.
    pub fn primitive_count(&self) -> usize {
        self.primitives
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
