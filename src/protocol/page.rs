//! # Page Mode Commands
//!
//! In page mode the printer composes the whole print area in memory and
//! prints it in one pass, instead of printing each line as it arrives.
//! Bitmaps are wrapped this way so a slow Bluetooth link cannot leave gaps
//! between bands.
//!
//! ## Workflow
//!
//! 1. Enter page mode (`ESC L`)
//! 2. Define the print area (`ESC W`)
//! 3. Send content
//! 4. Print the page (`ESC FF`)
//! 5. Return to standard mode (`ESC S`)

use super::commands::{ESC, FF, u16_le};

/// Extra dots added below the content so the last row is not clipped.
pub const PAGE_SLACK_DOTS: u16 = 40;

/// Enter page mode (ESC L)
#[inline]
pub fn page_mode_enter() -> Vec<u8> {
    vec![ESC, b'L']
}

/// # Set Print Area in Page Mode (ESC W)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC W xL xH yL yH dxL dxH dyL dyH |
/// | Hex     | 1B 57 ... |
///
/// All values are in dots.
pub fn set_print_area(x: u16, y: u16, width: u16, height: u16) -> Vec<u8> {
    let mut cmd = vec![ESC, b'W'];
    cmd.extend(u16_le(x));
    cmd.extend(u16_le(y));
    cmd.extend(u16_le(width));
    cmd.extend(u16_le(height));
    cmd
}

/// Print the composed page (ESC FF)
#[inline]
pub fn print_page() -> Vec<u8> {
    vec![ESC, FF]
}

/// Return to standard mode (ESC S)
#[inline]
pub fn page_mode_exit() -> Vec<u8> {
    vec![ESC, b'S']
}

/// Wrap `body` in a full page-mode sequence sized for `width` x `height` dots.
///
/// ```
/// use estrellita::protocol::page;
///
/// let wrapped = page::wrap(16, 8, &[0xAA]);
/// assert_eq!(&wrapped[..2], &[0x1B, 0x4C]);
/// assert_eq!(&wrapped[wrapped.len() - 4..], &[0x1B, 0x0C, 0x1B, 0x53]);
/// ```
pub fn wrap(width: u16, height: u16, body: &[u8]) -> Vec<u8> {
    let mut out = page_mode_enter();
    out.extend(set_print_area(
        0,
        0,
        width,
        height.saturating_add(PAGE_SLACK_DOTS),
    ));
    out.extend_from_slice(body);
    out.extend(print_page());
    out.extend(page_mode_exit());
    out
}
