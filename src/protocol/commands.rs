//! # ESC/POS Base Commands
//!
//! Control bytes and the small commands shared by every encoder: initialize,
//! feeds, cutter, drawer kick, and real-time status requests.
//!
//! Star portable printers run an ESC/POS emulation (`portable;escpos`).
//! Commands are byte sequences starting with a control prefix:
//!
//! - Single byte: `LF`, `FF`
//! - Two bytes: `ESC @`, `FS &`
//! - With parameters: `ESC d n`, `GS k m n data...`
//!
//! ## Byte Order
//!
//! Multi-byte integers are **little-endian**:
//! - `u16` value 0x1234 is sent as `[0x34, 0x12]`

// ============================================================================
// CONTROL BYTES
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Character size, barcodes, raster graphics, left margin.
pub const GS: u8 = 0x1D;

/// FS (File Separator) - Double-byte (kanji) command prefix
pub const FS: u8 = 0x1C;

/// DLE (Data Link Escape) - Real-time command prefix
pub const DLE: u8 = 0x10;

/// EOT (End of Transmission) - Used with DLE for status requests
pub const EOT: u8 = 0x04;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

/// FF (Form Feed) - Print the composed page in page mode
pub const FF: u8 = 0x0C;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets text formatting, alignment, and
/// margins to power-on defaults.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## Example
///
/// ```
/// use estrellita::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// Print the line buffer and advance one line.
#[inline]
pub fn lf() -> Vec<u8> {
    vec![LF]
}

/// # Print and Feed n Lines (ESC d n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC d n |
/// | Hex     | 1B 64 n |
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Print and Feed n Dots (ESC J n)
///
/// Feeds in motion units (1 dot at 203 DPI ≈ 0.125mm). Printing an image
/// is usually followed by `ESC J 40` so the last band clears the tear bar.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC J n |
/// | Hex     | 1B 4A n |
#[inline]
pub fn feed_dots(n: u8) -> Vec<u8> {
    vec![ESC, b'J', n]
}

// ============================================================================
// CUTTER (POS MODELS ONLY)
// ============================================================================

/// # Feed and Full Cut (GS V 65 n)
///
/// Feeds `n` dots past the cutting position then cuts fully.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS V A n |
/// | Hex     | 1D 56 41 n |
#[inline]
pub fn cut_full_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', 65, n]
}

/// # Feed and Partial Cut (GS V 66 n)
///
/// Leaves a small tab connecting the receipt.
#[inline]
pub fn cut_partial_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', 66, n]
}

// ============================================================================
// PERIPHERALS
// ============================================================================

/// # Generate Drawer Pulse (ESC p m t1 t2)
///
/// Pulse on connector pin `m` (0 = pin 2, 1 = pin 5) for `t1 * 2ms` on and
/// `t2 * 2ms` off.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC p m t1 t2 |
/// | Hex     | 1B 70 m t1 t2 |
#[inline]
pub fn drawer_kick(pin: u8, on_time: u8, off_time: u8) -> Vec<u8> {
    vec![ESC, b'p', pin & 1, on_time, off_time]
}

// ============================================================================
// REAL-TIME STATUS
// ============================================================================

/// Which status byte to request with [`status_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Drawer pin, online/offline
    Printer = 1,
    /// Cover, feed button, error stop
    OfflineCause = 2,
    /// Cutter, unrecoverable, auto-recoverable errors
    ErrorCause = 3,
    /// Paper near-end and end sensors
    PaperSensor = 4,
}

impl StatusKind {
    pub const ALL: [StatusKind; 4] = [
        Self::Printer,
        Self::OfflineCause,
        Self::ErrorCause,
        Self::PaperSensor,
    ];
}

/// # Real-Time Status Transmission (DLE EOT n)
///
/// The printer answers with one byte immediately, even while offline.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | DLE EOT n |
/// | Hex     | 10 04 n |
#[inline]
pub fn status_request(kind: StatusKind) -> Vec<u8> {
    vec![DLE, EOT, kind as u8]
}

// ============================================================================
// PRINTER IDENTIFICATION
// ============================================================================

/// Header byte of a `GS I` text reply.
pub const ID_REPLY_HEADER: u8 = 0x5F;

/// Terminator of a `GS I` text reply.
pub const ID_REPLY_END: u8 = 0x00;

/// What to ask for with [`printer_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterInfo {
    FirmwareVersion = 65,
    Maker = 66,
    ModelName = 67,
}

/// # Transmit Printer ID (GS I n)
///
/// The reply is `_` (5F), the ASCII text, then NUL.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS I n |
/// | Hex     | 1D 49 n |
///
/// | n | Reply |
/// |---|-------|
/// | 65 | Firmware version |
/// | 66 | Maker name |
/// | 67 | Model name |
#[inline]
pub fn printer_id(info: PrinterInfo) -> Vec<u8> {
    vec![GS, b'I', info as u8]
}

// ============================================================================
// HELPERS
// ============================================================================

/// Little-endian bytes of a `u16`.
#[inline]
pub fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Little-endian bytes of a `u32`.
#[inline]
pub fn u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}
