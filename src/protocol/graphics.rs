//! # Raster Graphics Commands
//!
//! Raw and compressed raster bit images.
//!
//! ## Bit Packing
//!
//! Each bit is one dot, rows are row-major:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```
//!
//! ## Commands
//!
//! | Mode | Command | Payload |
//! |------|---------|---------|
//! | Raw | `GS v 0 m xL xH yL yH` | `x * y` bytes |
//! | Compressed | `GS v 1 m xL xH yL yH c1 c2 c3 c4` | PackBits stream, `c` bytes |
//!
//! `x` is the width in **bytes**, `y` the height in dots. Both builders
//! check that the data matches the header before returning.
//!
//! ## Compression
//!
//! The compressed command carries each row as a PackBits stream (the TIFF
//! scheme): a header byte `n` followed by either `n + 1` literal bytes
//! (`0..=127`) or one byte repeated `1 - n` times (`-127..=-1` as `i8`).
//! Receipt images are mostly white, so long zero runs collapse to two bytes
//! per 128 bytes.

use super::commands::{GS, u16_le, u32_le};
use crate::error::EncodingError;

/// Raster scaling mode `m` (normal density)
const RASTER_NORMAL: u8 = 0;

// ============================================================================
// RAW RASTER (GS v 0)
// ============================================================================

fn check_size(width_bytes: u16, height: u16, data: &[u8]) -> Result<(), EncodingError> {
    let expected = width_bytes as usize * height as usize;
    if data.len() != expected {
        return Err(EncodingError::RasterSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn header(kind: u8, width_bytes: u16, height: u16) -> Vec<u8> {
    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);
    vec![GS, b'v', kind, RASTER_NORMAL, xl, xh, yl, yh]
}

/// # Print Raster Bit Image (GS v 0)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH d1...dk |
/// | Hex     | 1D 76 00 m xL xH yL yH d1...dk |
///
/// The selector is the byte `0x00` (`0x01` for the compressed form).
///
/// ## Example
///
/// ```
/// use estrellita::protocol::graphics;
///
/// let cmd = graphics::raster(2, 1, &[0xFF, 0x00]).unwrap();
/// assert_eq!(cmd, vec![0x1D, 0x76, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0xFF, 0x00]);
/// ```
///
/// ## Errors
///
/// [`EncodingError::RasterSizeMismatch`] unless `data.len() == width_bytes * height`.
pub fn raster(width_bytes: u16, height: u16, data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    check_size(width_bytes, height, data)?;
    let mut cmd = header(0, width_bytes, height);
    cmd.reserve(data.len());
    cmd.extend_from_slice(data);
    Ok(cmd)
}

// ============================================================================
// COMPRESSED RASTER (GS v 1)
// ============================================================================

/// Append one row as PackBits.
pub fn pack_bits(row: &[u8], out: &mut Vec<u8>) {
    let n = row.len();
    let mut i = 0;
    while i < n {
        let mut run = 1;
        while i + run < n && run < 128 && row[i + run] == row[i] {
            run += 1;
        }

        if run >= 2 {
            out.push((1 - run as i16) as i8 as u8);
            out.push(row[i]);
            i += run;
            continue;
        }

        // Literal until the next repeat starts or the block is full
        let start = i;
        i += 1;
        while i < n && i - start < 128 && !(i + 1 < n && row[i] == row[i + 1]) {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&row[start..i]);
    }
}

/// Length a PackBits stream expands to, or `None` if it is truncated.
fn unpacked_len(stream: &[u8]) -> Option<usize> {
    let mut total = 0;
    let mut i = 0;
    while i < stream.len() {
        let n = stream[i] as i8;
        i += 1;
        match n {
            0..=127 => {
                let count = n as usize + 1;
                if i + count > stream.len() {
                    return None;
                }
                total += count;
                i += count;
            }
            -127..=-1 => {
                if i >= stream.len() {
                    return None;
                }
                total += (1 - n as isize) as usize;
                i += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }
    Some(total)
}

/// # Print Compressed Raster Bit Image (GS v 1)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 1 m xL xH yL yH c1 c2 c3 c4 d1...dc |
/// | Hex     | 1D 76 01 m xL xH yL yH c1 c2 c3 c4 d1...dc |
///
/// `c1..c4` is the compressed length, little-endian.
///
/// ## Errors
///
/// [`EncodingError::RasterSizeMismatch`] if the input does not match the
/// header, or if the compressed stream would not expand back to it.
pub fn compressed_raster(
    width_bytes: u16,
    height: u16,
    data: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    check_size(width_bytes, height, data)?;

    let mut packed = Vec::with_capacity(data.len() / 4);
    if width_bytes > 0 {
        for row in data.chunks(width_bytes as usize) {
            pack_bits(row, &mut packed);
        }
    }

    let expanded = unpacked_len(&packed).unwrap_or(0);
    if expanded != data.len() {
        return Err(EncodingError::RasterSizeMismatch {
            expected: data.len(),
            actual: expanded,
        });
    }

    let mut cmd = header(1, width_bytes, height);
    cmd.extend(u32_le(packed.len() as u32));
    cmd.extend(packed);
    Ok(cmd)
}

// ============================================================================
// TESTS
// ============================================================================
