//! # Text Commands
//!
//! Text attributes, alignment, margins, and the text-run encoders.
//!
//! ## Attribute Layout
//!
//! | Attribute | Command | Notes |
//! |-----------|---------|-------|
//! | Emphasized + underline | `ESC ! n` | bit 3 emphasized, bit 7 underline |
//! | Upside-down | `ESC { n` | bit 0 |
//! | Reverse (white on black) | `GS B n` | bit 0 |
//! | Character size | `GS ! n` | high nibble width-1, low nibble height-1 |
//! | Alignment | `ESC a n` | 0 left, 1 center, 2 right |
//! | Left margin | `GS L nL nH` | dots |
//!
//! The printer keeps every one of these as session state until `ESC @`.
//! [`FormattingState`] models that state so callers can emit either the full
//! set or only what changed since the previous run.
//!
//! ## Double-Byte Text
//!
//! Japanese (Shift-JIS) and Traditional Chinese (Big5) runs are transcoded
//! with `encoding_rs` and bracketed by a charset select and an explicit
//! `FS .` reset, so the next single-byte run never inherits kanji mode.
//!
//! Single-byte runs from Unicode strings go through [`super::codepage`].

use serde::{Deserialize, Serialize};

use super::commands::{ESC, FS, GS, LF, u16_le};
use crate::error::EncodingError;
use crate::printer::Limits;

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
/// | Decimal | 27 97 n |
///
/// Takes effect at the start of the next line.
///
/// ## Example
///
/// ```
/// use estrellita::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
#[inline]
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// Underline bit of the `ESC !` attribute byte
pub const MODE_UNDERLINE: u8 = 0x80;

/// Emphasized bit of the `ESC !` attribute byte
pub const MODE_EMPHASIZED: u8 = 0x08;

/// # Select Print Mode (ESC ! n)
///
/// Packs underline and emphasized into one attribute byte.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC ! n |
/// | Hex     | 1B 21 n |
///
/// ## Example
///
/// ```
/// use estrellita::protocol::text::print_mode;
///
/// assert_eq!(print_mode(false, true), vec![0x1B, 0x21, 0x08]);
/// assert_eq!(print_mode(true, true), vec![0x1B, 0x21, 0x88]);
/// ```
pub fn print_mode(underline: bool, emphasized: bool) -> Vec<u8> {
    let mut n = 0;
    if underline {
        n |= MODE_UNDERLINE;
    }
    if emphasized {
        n |= MODE_EMPHASIZED;
    }
    vec![ESC, b'!', n]
}

/// Upside-down printing on/off (ESC { n)
#[inline]
pub fn upside_down(enabled: bool) -> Vec<u8> {
    vec![ESC, b'{', enabled as u8]
}

/// White-on-black reverse printing on/off (GS B n)
#[inline]
pub fn invert(enabled: bool) -> Vec<u8> {
    vec![GS, b'B', enabled as u8]
}

/// # Select Character Size (GS ! n)
///
/// Each scale is a magnification step 1..=8; values outside are clamped.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS ! n |
/// | Hex     | 1D 21 n |
///
/// ```text
/// n = (width - 1) << 4 | (height - 1)
/// ```
///
/// ## Example
///
/// ```
/// use estrellita::protocol::text::size;
///
/// assert_eq!(size(2, 2), vec![0x1D, 0x21, 0x11]);
/// assert_eq!(size(3, 1), vec![0x1D, 0x21, 0x02]);
/// assert_eq!(size(0, 99), vec![0x1D, 0x21, 0x70]);
/// ```
pub fn size(height: u8, width: u8) -> Vec<u8> {
    let h = height.clamp(1, 8) - 1;
    let w = width.clamp(1, 8) - 1;
    vec![GS, b'!', (w << 4) | h]
}

/// # Set Left Margin (GS L nL nH)
///
/// Absolute offset from the left edge of the printable area, in dots.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS L nL nH |
/// | Hex     | 1D 4C nL nH |
pub fn left_margin(dots: u16) -> Vec<u8> {
    let [lo, hi] = u16_le(dots);
    vec![GS, b'L', lo, hi]
}

// ============================================================================
// FORMATTING STATE
// ============================================================================

/// # Formatting State
///
/// The text attributes the device is holding. A text run declares the full
/// state it wants; the encoder turns that into commands.
///
/// ```
/// use estrellita::protocol::text::{FormattingState, Alignment};
///
/// let state = FormattingState::new().emphasized(true).center().scale(2, 2);
/// assert_eq!(state.alignment, Alignment::Center);
/// assert_eq!(state.height_scale, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingState {
    pub underline: bool,
    pub emphasized: bool,
    pub upside_down: bool,
    pub invert: bool,
    pub height_scale: u8,
    pub width_scale: u8,
    pub left_margin: u16,
    pub alignment: Alignment,
}

impl Default for FormattingState {
    fn default() -> Self {
        Self {
            underline: false,
            emphasized: false,
            upside_down: false,
            invert: false,
            height_scale: 1,
            width_scale: 1,
            left_margin: 0,
            alignment: Alignment::Left,
        }
    }
}

impl FormattingState {
    /// Power-on state (what `ESC @` restores).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn underline(mut self, enabled: bool) -> Self {
        self.underline = enabled;
        self
    }

    pub fn emphasized(mut self, enabled: bool) -> Self {
        self.emphasized = enabled;
        self
    }

    pub fn upside_down(mut self, enabled: bool) -> Self {
        self.upside_down = enabled;
        self
    }

    pub fn invert(mut self, enabled: bool) -> Self {
        self.invert = enabled;
        self
    }

    pub fn scale(mut self, height: u8, width: u8) -> Self {
        self.height_scale = height;
        self.width_scale = width;
        self
    }

    pub fn left_margin(mut self, dots: u16) -> Self {
        self.left_margin = dots;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn center(self) -> Self {
        self.alignment(Alignment::Center)
    }

    pub fn right(self) -> Self {
        self.alignment(Alignment::Right)
    }

    /// Clamp scales and margin to what the model can do.
    pub fn clamped(mut self, limits: &Limits) -> Self {
        let max = limits.max_text_scale.max(1);
        self.height_scale = self.height_scale.clamp(1, max);
        self.width_scale = self.width_scale.clamp(1, max);
        self.left_margin = self.left_margin.min(limits.max_dot_width);
        self
    }

    /// Every command needed to put the device in this state.
    ///
    /// Order: attribute byte, upside-down, reverse, size, alignment, margin.
    pub fn to_commands(&self) -> Vec<u8> {
        let mut cmds = Vec::with_capacity(20);
        cmds.extend(print_mode(self.underline, self.emphasized));
        cmds.extend(upside_down(self.upside_down));
        cmds.extend(invert(self.invert));
        cmds.extend(size(self.height_scale, self.width_scale));
        cmds.extend(align(self.alignment));
        cmds.extend(left_margin(self.left_margin));
        cmds
    }

    /// Only the commands that differ from `prev`, in the same order as
    /// [`Self::to_commands`].
    pub fn delta_commands(&self, prev: &FormattingState) -> Vec<u8> {
        let mut cmds = Vec::new();
        if self.underline != prev.underline || self.emphasized != prev.emphasized {
            cmds.extend(print_mode(self.underline, self.emphasized));
        }
        if self.upside_down != prev.upside_down {
            cmds.extend(upside_down(self.upside_down));
        }
        if self.invert != prev.invert {
            cmds.extend(invert(self.invert));
        }
        if self.height_scale != prev.height_scale || self.width_scale != prev.width_scale {
            cmds.extend(size(self.height_scale, self.width_scale));
        }
        if self.alignment != prev.alignment {
            cmds.extend(align(self.alignment));
        }
        if self.left_margin != prev.left_margin {
            cmds.extend(left_margin(self.left_margin));
        }
        cmds
    }
}

// ============================================================================
// TEXT RUN ENCODERS
// ============================================================================

/// # Encode a Text Run
///
/// Full attribute set, then the content bytes, then `LF`. Content must
/// already be in the printer's single-byte code page.
///
/// ## Example
///
/// ```
/// use estrellita::printer::Limits;
/// use estrellita::protocol::text::{encode_text, FormattingState};
///
/// let state = FormattingState::new().emphasized(true).center();
/// let bytes = encode_text(&state, b"HELLO", &Limits::default());
/// assert_eq!(&bytes[..3], &[0x1B, 0x21, 0x08]);
/// assert!(bytes.ends_with(b"HELLO\n"));
/// ```
pub fn encode_text(state: &FormattingState, content: &[u8], limits: &Limits) -> Vec<u8> {
    let state = state.clamped(limits);
    let mut out = state.to_commands();
    out.reserve(content.len() + 1);
    out.extend_from_slice(content);
    out.push(LF);
    out
}

/// Encode a text run emitting only the attribute changes from `prev`.
///
/// Returns the bytes and the state the device is left in.
pub fn encode_text_delta(
    prev: &FormattingState,
    state: &FormattingState,
    content: &[u8],
    limits: &Limits,
) -> (Vec<u8>, FormattingState) {
    let state = state.clamped(limits);
    let mut out = state.delta_commands(prev);
    out.extend_from_slice(content);
    out.push(LF);
    (out, state)
}

// ============================================================================
// DOUBLE-BYTE TEXT
// ============================================================================

/// East-Asian double-byte character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleByteCharset {
    /// Japanese
    ShiftJis,
    /// Traditional Chinese
    Big5,
}

impl DoubleByteCharset {
    pub fn name(self) -> &'static str {
        match self {
            Self::ShiftJis => "Shift_JIS",
            Self::Big5 => "Big5",
        }
    }

    fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::Big5 => encoding_rs::BIG5,
        }
    }

    /// # Enter Double-Byte Mode
    ///
    /// | Charset | Bytes |
    /// |---------|-------|
    /// | Shift-JIS | `FS C 1` `FS &` (1C 43 01 1C 26) |
    /// | Big5 | `FS &` (1C 26) |
    pub fn select(self) -> Vec<u8> {
        match self {
            Self::ShiftJis => vec![FS, b'C', 1, FS, b'&'],
            Self::Big5 => vec![FS, b'&'],
        }
    }

    /// Transcode UTF-8 text into this charset.
    ///
    /// ## Errors
    ///
    /// [`EncodingError::UnmappableText`] if any character has no mapping.
    pub fn transcode(self, content: &str) -> Result<Vec<u8>, EncodingError> {
        let (bytes, _, had_errors) = self.encoding().encode(content);
        if had_errors {
            return Err(EncodingError::UnmappableText {
                charset: self.name(),
            });
        }
        Ok(bytes.into_owned())
    }
}

/// # Cancel Double-Byte Mode (FS .)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | FS . |
/// | Hex     | 1C 2E |
#[inline]
pub fn cancel_double_byte() -> Vec<u8> {
    vec![FS, b'.']
}

/// # Encode a Double-Byte Text Run
///
/// Charset select, full attribute set, transcoded content, `LF`, then
/// `FS .` so the device is back in single-byte mode afterwards.
pub fn encode_double_byte_text(
    state: &FormattingState,
    charset: DoubleByteCharset,
    content: &str,
    limits: &Limits,
) -> Result<Vec<u8>, EncodingError> {
    let encoded = charset.transcode(content)?;
    let mut out = charset.select();
    out.extend(encode_text(state, &encoded, limits));
    out.extend(cancel_double_byte());
    Ok(out)
}

/// Delta variant of [`encode_double_byte_text`] for the job composer.
pub fn encode_double_byte_text_delta(
    prev: &FormattingState,
    state: &FormattingState,
    charset: DoubleByteCharset,
    content: &str,
    limits: &Limits,
) -> Result<(Vec<u8>, FormattingState), EncodingError> {
    let encoded = charset.transcode(content)?;
    let mut out = charset.select();
    let (run, state) = encode_text_delta(prev, state, &encoded, limits);
    out.extend(run);
    out.extend(cancel_double_byte());
    Ok((out, state))
}

// ============================================================================
// TESTS
// ============================================================================
