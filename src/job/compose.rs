//! # Job Composer
//!
//! Encodes primitives in order into one buffer, then appends the trailing
//! actions.
//!
//! The buffer always starts with `ESC @`, so the composer knows the device
//! is in the default [`FormattingState`]. From there it threads the state
//! through each text run and emits only the attribute commands that change.
//! Non-text primitives leave the state untouched.
//!
//! ```text
//! ESC @ │ text(delta) │ barcode │ text(delta) │ bitmap │ ... │ feed │ cut
//! ```
//!
//! Composition stops at the first primitive that fails to encode; nothing
//! from a failed job is ever returned.

use tracing::{debug, trace};

use super::primitive::{PrintJob, PrintPrimitive, TrailingAction};
use crate::error::{EncodingError, PrintError};
use crate::printer::Limits;
use crate::protocol::text::{self, FormattingState};
use crate::protocol::{barcode, commands};
use crate::render::bitmap;

/// Dots fed past the print head before the cutter fires
const CUT_FEED_DOTS: u8 = 24;

/// Drawer pulse on/off times in 2ms units
const DRAWER_PULSE: (u8, u8) = (25, 250);

/// Encode one primitive given the current device state.
///
/// Returns the bytes and the state the device is left in.
pub fn encode_primitive(
    primitive: &PrintPrimitive,
    state: &FormattingState,
    limits: &Limits,
) -> Result<(Vec<u8>, FormattingState), EncodingError> {
    match primitive {
        PrintPrimitive::Text { content, format } => {
            Ok(text::encode_text_delta(state, format, content, limits))
        }
        PrintPrimitive::DoubleByteText {
            content,
            charset,
            format,
        } => text::encode_double_byte_text_delta(state, format, *charset, content, limits),
        PrintPrimitive::Barcode {
            symbology,
            height,
            width,
            payload,
        } => {
            let bytes = barcode::encode_barcode(*symbology, *height, *width, payload, limits)?;
            Ok((bytes, *state))
        }
        PrintPrimitive::QrCode {
            correction_level,
            module_size,
            size_by_ec_level,
            payload,
        } => {
            let bytes = barcode::encode_qr(
                *correction_level,
                *size_by_ec_level,
                *module_size,
                payload,
                limits,
            )?;
            Ok((bytes, *state))
        }
        PrintPrimitive::Pdf417 {
            width,
            columns,
            security_level,
            ratio,
            payload,
        } => {
            let bytes = barcode::encode_pdf417(
                *width,
                *columns,
                *security_level,
                *ratio,
                payload,
                limits,
            )?;
            Ok((bytes, *state))
        }
        PrintPrimitive::Bitmap { image, options } => {
            let bytes = bitmap::transcode(image, options, limits)?;
            Ok((bytes, *state))
        }
    }
}

/// Encode one trailing action.
pub fn encode_trailing(action: &TrailingAction, limits: &Limits) -> Result<Vec<u8>, EncodingError> {
    match *action {
        TrailingAction::Feed { lines } => Ok(commands::feed_lines(lines)),
        TrailingAction::FeedDots { dots } => Ok(commands::feed_dots(dots)),
        TrailingAction::Cut { partial } => {
            if !limits.has_cutter {
                return Err(EncodingError::UnsupportedAction {
                    action: "cut",
                    model: limits.name,
                });
            }
            Ok(if partial {
                commands::cut_partial_feed(CUT_FEED_DOTS)
            } else {
                commands::cut_full_feed(CUT_FEED_DOTS)
            })
        }
        TrailingAction::OpenDrawer => {
            if !limits.has_drawer {
                return Err(EncodingError::UnsupportedAction {
                    action: "cash drawer",
                    model: limits.name,
                });
            }
            Ok(commands::drawer_kick(0, DRAWER_PULSE.0, DRAWER_PULSE.1))
        }
    }
}

/// # Compose a Job
///
/// ## Errors
///
/// [`PrintError::Encoding`] for the first element that fails. `index` counts
/// primitives first, then trailing actions (`primitives.len() + i`).
///
/// ## Example
///
/// ```
/// use estrellita::job::{compose, PrintPrimitive, TrailingAction};
/// use estrellita::printer::Limits;
/// use estrellita::protocol::text::FormattingState;
///
/// let job = compose(
///     &[PrintPrimitive::text("HELLO", FormattingState::new().center())],
///     &[TrailingAction::Feed { lines: 3 }],
///     &Limits::default(),
/// )?;
/// assert_eq!(&job.as_bytes()[..2], &[0x1B, 0x40]);
/// assert!(job.as_bytes().ends_with(&[0x1B, 0x64, 3]));
/// # Ok::<(), estrellita::error::PrintError>(())
/// ```
pub fn compose(
    primitives: &[PrintPrimitive],
    trailing: &[TrailingAction],
    limits: &Limits,
) -> Result<PrintJob, PrintError> {
    let mut out = commands::init();
    let mut state = FormattingState::default();

    for (index, primitive) in primitives.iter().enumerate() {
        let (bytes, next) = encode_primitive(primitive, &state, limits)
            .map_err(|source| PrintError::Encoding { index, source })?;
        trace!(index, kind = primitive.kind(), len = bytes.len(), "encoded primitive");
        out.extend(bytes);
        state = next;
    }

    for (i, action) in trailing.iter().enumerate() {
        let bytes = encode_trailing(action, limits).map_err(|source| PrintError::Encoding {
            index: primitives.len() + i,
            source,
        })?;
        out.extend(bytes);
    }

    debug!(
        primitives = primitives.len(),
        trailing = trailing.len(),
        bytes = out.len(),
        "composed job"
    );
    Ok(PrintJob::new(out, primitives.len()))
}

// ============================================================================
// TESTS
// ============================================================================
